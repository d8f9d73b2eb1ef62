use reqwest::Method as HttpMethod;
use serde_json::{Value, json};
use tracing::debug;

use tidekv_common::API_KEY_HEADER;
use tidekv_protocol::{Command, Method};

/// Cliente HTTP do painel de controle.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl Client {
    pub fn new(base_url: &str, api_key: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tidekv-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Envia o comando e devolve o corpo JSON da resposta.
    ///
    /// Respostas de erro do servidor também voltam como `Ok` com um objeto
    /// `{error}`; só falhas de transporte viram `Err`.
    pub async fn send(&self, cmd: &Command) -> anyhow::Result<Value> {
        let route = cmd.to_route();
        let method = match route.method {
            Method::Get => HttpMethod::GET,
            Method::Post => HttpMethod::POST,
            Method::Delete => HttpMethod::DELETE,
        };
        let url = format!("{}{}", self.base_url, route.path);

        debug!("{method} {url}");
        let mut req = self.http.request(method, url);
        if !route.query.is_empty() {
            req = req.query(&route.query);
        }
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }
        if let Some(body) = &route.body {
            req = req.json(body);
        }

        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;

        Ok(serde_json::from_str(&text)
            .unwrap_or_else(|_| json!({ "error": format!("HTTP {status}: {text}") })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    use tidekv_server::{AppState, ServerConfig, router};

    async fn spawn_server() -> String {
        let config = ServerConfig::default().with_admin_key("admin-key");
        let app = router(AppState::new(&config), config.max_body_bytes);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn cmd(tokens: &[&str]) -> Command {
        Command::from_args(tokens.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[tokio::test]
    async fn round_trip_against_server() {
        let url = spawn_server().await;
        let client = Client::new(&url, Some("admin-key".into())).unwrap();

        let reply = client.send(&cmd(&["set", "greeting", "hello world"])).await.unwrap();
        assert_eq!(reply["message"], json!("Stored 'greeting' successfully!"));

        let reply = client.send(&cmd(&["get", "greeting"])).await.unwrap();
        assert_eq!(reply["value"], json!("hello world"));

        let reply = client.send(&cmd(&["enqueue", "jobs", "a b"])).await.unwrap();
        assert!(reply.get("message").is_some());
        let reply = client.send(&cmd(&["dequeue", "jobs"])).await.unwrap();
        assert_eq!(reply["value"], json!("a b"));

        let reply = client.send(&cmd(&["del", "greeting"])).await.unwrap();
        assert!(reply.get("message").is_some());
        let reply = client.send(&cmd(&["get", "greeting"])).await.unwrap();
        assert_eq!(reply["error"], json!("Key not found"));
    }

    #[tokio::test]
    async fn wrong_key_is_reported_as_error_body() {
        let url = spawn_server().await;
        let client = Client::new(&url, Some("nope".into())).unwrap();

        let reply = client.send(&cmd(&["keys"])).await.unwrap();
        assert_eq!(reply["error"], json!("Unauthorized. Invalid API Key"));

        // health não exige chave
        let reply = client.send(&cmd(&["health"])).await.unwrap();
        assert_eq!(reply["status"], json!("ok"));
    }
}
