use std::io::{self, Write};

use clap::Parser;
use serde_json::Value;

use tidekv_common::DEFAULT_URL;
use tidekv_protocol::Command;

mod client;

use client::Client;

#[derive(Parser, Debug)]
#[command(name = "tidekv-cli", about = "TideKV: painel de controle em linha de comando")]
struct Args {
    #[arg(long, env = "TIDEKV_URL", default_value = DEFAULT_URL)]
    url: String,
    #[arg(long, short = 'k', env = "TIDEKV_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Comando para executar diretamente (modo não interativo)
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let client = Client::new(&args.url, args.api_key)?;

    // Modo comando único (via argumentos)
    if !args.command.is_empty() {
        println!("{}", run_line(&client, args.command).await);
        return Ok(());
    }

    println!("Painel TideKV em {}", client.base_url());

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("tidekv> ");
        io::stdout().flush()?;

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break; // EOF
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let tokens = tokenize(line);
        if tokens.is_empty() {
            continue;
        }

        println!("{}", run_line(&client, tokens).await);
    }

    Ok(())
}

/// Executa uma linha já tokenizada e devolve o texto a exibir.
async fn run_line(client: &Client, tokens: Vec<String>) -> String {
    let (tokens, filter) = split_keys_filter(tokens);

    let cmd = match Command::from_args(tokens) {
        Ok(cmd) => cmd,
        Err(e) => return format!("(error) {e}"),
    };

    match client.send(&cmd).await {
        Ok(reply) => {
            let reply = match filter {
                Some(filter) => filter_keys(reply, &filter),
                None => reply,
            };
            format_reply(&reply)
        }
        Err(e) => format!("(error) {e}"),
    }
}

/// `keys <filtro>`: o filtro é aplicado no cliente, não vai para o servidor.
fn split_keys_filter(mut tokens: Vec<String>) -> (Vec<String>, Option<String>) {
    let is_keys = tokens
        .first()
        .is_some_and(|name| name.eq_ignore_ascii_case("keys") || name.eq_ignore_ascii_case("list_keys"));
    if is_keys && tokens.len() == 2 {
        let filter = tokens.pop();
        return (tokens, filter);
    }
    (tokens, None)
}

/// Mantém só as chaves que contêm `filter`, sem diferenciar maiúsculas.
fn filter_keys(mut reply: Value, filter: &str) -> Value {
    let needle = filter.to_lowercase();
    if let Some(keys) = reply.get_mut("keys").and_then(Value::as_array_mut) {
        keys.retain(|key| {
            key.as_str()
                .is_some_and(|k| k.to_lowercase().contains(&needle))
        });
    }
    reply
}

/// Tokeniza a linha de input com suporte a strings quoted.
///
/// Aspas vazias (`''`) produzem um token vazio.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quote = false;
    let mut quote_char = '"';
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quote {
            if c == quote_char {
                in_quote = false;
            } else if c == '\\' {
                let escaped = match chars.peek() {
                    Some('n') => Some('\n'),
                    Some('t') => Some('\t'),
                    Some(&ch) if matches!(ch, '\\' | '"' | '\'') => Some(ch),
                    _ => None,
                };
                match escaped {
                    Some(ch) => {
                        current.push(ch);
                        chars.next();
                    }
                    None => current.push(c),
                }
            } else {
                current.push(c);
            }
        } else if c == '"' || c == '\'' {
            in_quote = true;
            quoted = true;
            quote_char = c;
        } else if c.is_whitespace() {
            if !current.is_empty() || quoted {
                tokens.push(std::mem::take(&mut current));
                quoted = false;
            }
        } else {
            current.push(c);
        }
    }

    if !current.is_empty() || quoted {
        tokens.push(current);
    }

    tokens
}

/// Formata uma resposta JSON para exibição humana.
fn format_reply(reply: &Value) -> String {
    if let Some(error) = reply.get("error") {
        return format!("(error) {}", as_text(error));
    }
    if let Some(message) = reply.get("message") {
        return format!("\"{}\"", as_text(message));
    }
    if let Some(logs) = reply.get("logs").and_then(Value::as_array) {
        return numbered(logs, format_log_entry);
    }
    if let Some(keys) = reply.get("keys").and_then(Value::as_array) {
        return numbered(keys, |k| format!("\"{}\"", as_text(k)));
    }
    if let Some(queues) = reply.get("queues").and_then(Value::as_array) {
        return numbered(queues, |q| format!("\"{}\"", as_text(q)));
    }
    if let Some(ttl) = reply.get("ttl").and_then(Value::as_i64) {
        return format!("(integer) {ttl}");
    }
    if let Some(api_key) = reply.get("api_key") {
        return format!(
            "\"{}\" (role: {})",
            as_text(api_key),
            reply.get("role").map(as_text).unwrap_or_default()
        );
    }
    if let Some(status) = reply.get("status") {
        let field = |name: &str| reply.get(name).map(as_text).unwrap_or_default();
        return format!(
            "status: {}\nversion: {}\nkeys: {}\nqueues: {}",
            as_text(status),
            field("version"),
            field("keys"),
            field("queues")
        );
    }
    match reply.get("value") {
        Some(Value::Number(n)) => format!("(integer) {n}"),
        Some(value) => format!("\"{}\"", as_text(value)),
        None => reply.to_string(),
    }
}

fn numbered(items: &[Value], fmt: impl Fn(&Value) -> String) -> String {
    if items.is_empty() {
        return "(empty list)".to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}) {}", i + 1, fmt(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_log_entry(entry: &Value) -> String {
    let when = entry
        .get("timestamp")
        .and_then(Value::as_i64)
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();
    let field = |name: &str| entry.get(name).map(as_text).unwrap_or_default();
    format!(
        "{when} {} {} [{}]",
        field("user_id"),
        field("endpoint"),
        field("api_key")
    )
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
