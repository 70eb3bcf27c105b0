//! Vocabulary for the synthetic pt_BR customer and order data

pub const FIRST_NAMES: &[&str] = &[
    "Ana", "Beatriz", "Bruna", "Camila", "Carolina", "Clara", "Fernanda", "Gabriela", "Helena",
    "Isabela", "Júlia", "Larissa", "Letícia", "Luana", "Mariana", "Maria", "Natália", "Rafaela",
    "Sofia", "Vitória", "André", "Antônio", "Bruno", "Caio", "Carlos", "Daniel", "Diego",
    "Eduardo", "Felipe", "Gabriel", "Guilherme", "Gustavo", "João", "José", "Lucas", "Marcelo",
    "Mateus", "Miguel", "Pedro", "Rafael", "Rodrigo", "Thiago", "Vinícius",
];

pub const LAST_NAMES: &[&str] = &[
    "Almeida", "Alves", "Araújo", "Barbosa", "Barros", "Cardoso", "Carvalho", "Castro", "Cavalcanti",
    "Correia", "Costa", "Dias", "Fernandes", "Ferreira", "Gomes", "Lima", "Martins", "Melo",
    "Mendes", "Moreira", "Nascimento", "Nunes", "Oliveira", "Pereira", "Pinto", "Ribeiro",
    "Rocha", "Rodrigues", "Santos", "Silva", "Soares", "Souza", "Teixeira", "Vieira",
];

pub const EMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "hotmail.com",
    "yahoo.com.br",
    "uol.com.br",
    "bol.com.br",
    "outlook.com",
];

pub const STREET_TYPES: &[&str] = &["Rua", "Avenida", "Travessa", "Alameda", "Praça", "Rodovia"];

pub const STREET_NAMES: &[&str] = &[
    "das Flores", "São João", "Sete de Setembro", "XV de Novembro", "Brasil", "Paulista",
    "Tiradentes", "Santos Dumont", "Dom Pedro II", "da Liberdade", "Getúlio Vargas",
    "Rio Branco", "das Palmeiras", "Marechal Deodoro", "Castro Alves",
];

pub const NEIGHBORHOODS: &[&str] = &[
    "Centro", "Jardim América", "Vila Nova", "Boa Vista", "Santa Efigênia", "Bela Vista",
    "Copacabana", "Savassi", "Moinhos de Vento", "Barra", "Pinheiros", "Aldeota",
];

/// (city, state)
pub const CITIES: &[(&str, &str)] = &[
    ("São Paulo", "SP"),
    ("Rio de Janeiro", "RJ"),
    ("Belo Horizonte", "MG"),
    ("Porto Alegre", "RS"),
    ("Salvador", "BA"),
    ("Recife", "PE"),
    ("Fortaleza", "CE"),
    ("Curitiba", "PR"),
    ("Campinas", "SP"),
    ("Florianópolis", "SC"),
    ("Manaus", "AM"),
    ("Goiânia", "GO"),
];

/// ascii only, descriptions are measured in bytes
pub const WORDS: &[&str] = &[
    "pedido", "cliente", "entrega", "produto", "importante", "urgente", "caixa", "envio",
    "pagamento", "nota", "fiscal", "prazo", "estoque", "loja", "compra", "valor", "frete",
    "endereco", "retirada", "confirmado", "aguardando", "transportadora", "embalagem",
    "presente", "troca", "garantia", "desconto", "cupom", "parcela", "boleto", "cartao",
    "item", "unidade", "quantidade", "tamanho", "cor", "modelo", "marca", "qualidade",
    "atendimento", "contato", "telefone", "manha", "tarde", "noite", "semana", "sexta",
    "sabado", "rapido", "fragil", "cuidado", "porta", "portaria", "vizinho", "recebido",
    "observacao", "solicitado", "separado", "conferido", "liberado",
];
