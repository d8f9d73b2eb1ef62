/// Erros de armazenamento/engine de dados.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("operação contra chave com tipo errado")]
    WrongType,
    #[error("valor não é um inteiro válido ou está fora do intervalo")]
    NotAnInteger,
    #[error("chave não encontrada")]
    KeyNotFound,
    #[error("campo não encontrado")]
    FieldNotFound,
    #[error("fila vazia")]
    QueueEmpty,
}

/// Erros de parsing/validação de comandos.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("comando desconhecido: {0}")]
    Unknown(String),
    #[error("número errado de argumentos para '{0}'")]
    WrongArity(String),
    #[error("campo obrigatório ausente: {0}")]
    MissingField(&'static str),
    #[error("argumento inválido: {0}")]
    InvalidArgument(String),
    #[error("ttl deve ser positivo, recebido {0}")]
    InvalidTtl(i64),
    #[error("papel inválido: {0}")]
    InvalidRole(String),
}

/// Erros de autorização. Chave ausente, vazia ou errada viram o mesmo
/// `Unauthorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("chave de API inválida")]
    Unauthorized,
    #[error("acesso restrito a administradores")]
    Forbidden,
}

/// Erro top-level do tidekv.
#[derive(Debug, thiserror::Error)]
pub enum TideError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Result type alias.
pub type TideResult<T> = Result<T, TideError>;
