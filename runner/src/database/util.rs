/// plain, unquoted sql identifier, i.e., safe to inline into DDL and file names
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();

    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
        && chars.all(|char| char.is_ascii_alphanumeric() || char == '_')
}
