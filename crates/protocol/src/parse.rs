use tidekv_common::CommandError;

/// Cursor sobre os tokens de uma linha de comando para extrair argumentos
/// sequencialmente.
pub struct Parse {
    parts: Vec<String>,
    pos: usize,
    command: String,
}

impl Parse {
    /// Cria um Parse a partir dos tokens. Exige ao menos o nome do comando.
    pub fn new(parts: Vec<String>) -> Result<Parse, CommandError> {
        if parts.is_empty() {
            return Err(CommandError::InvalidArgument("comando vazio".into()));
        }
        let command = parts[0].to_lowercase();
        Ok(Parse {
            parts,
            pos: 0,
            command,
        })
    }

    /// Retorna o próximo token. Faltar token é erro de aridade do comando.
    pub fn next_string(&mut self) -> Result<String, CommandError> {
        if self.pos >= self.parts.len() {
            return Err(CommandError::WrongArity(self.command.clone()));
        }
        let part = std::mem::take(&mut self.parts[self.pos]);
        self.pos += 1;
        Ok(part)
    }

    /// Retorna o próximo token como i64.
    pub fn next_int(&mut self) -> Result<i64, CommandError> {
        let s = self.next_string()?;
        s.parse::<i64>()
            .map_err(|_| CommandError::InvalidArgument(format!("'{s}' não é um inteiro")))
    }

    /// Retorna o próximo token, se houver.
    pub fn next_optional(&mut self) -> Option<String> {
        if self.has_remaining() {
            self.next_string().ok()
        } else {
            None
        }
    }

    /// Verifica se todos os argumentos foram consumidos.
    pub fn finish(&self) -> Result<(), CommandError> {
        if self.pos < self.parts.len() {
            Err(CommandError::InvalidArgument(
                "argumentos extras não esperados".into(),
            ))
        } else {
            Ok(())
        }
    }

    /// Verifica se ainda há argumentos restantes.
    pub fn has_remaining(&self) -> bool {
        self.pos < self.parts.len()
    }
}
