use super::util::is_identifier;

#[test]
pub fn plain_identifiers() {
    assert!(is_identifier("idx_ord_date"));
    assert!(is_identifier("_private2"));
    assert!(is_identifier("Orders"));
}

#[test]
pub fn rejected_identifiers() {
    assert!(!is_identifier(""));
    assert!(!is_identifier("2fast"));
    assert!(!is_identifier("idx; drop table orders"));
    assert!(!is_identifier("idx-date"));
    assert!(!is_identifier("índice"));
}
