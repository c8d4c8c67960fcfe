use std::fmt::Display;
use std::sync::{Arc, Mutex};

use log::{error, info, warn};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::catalog::{Product, ProductPatch, ProductService, SearchCriteria, DEFAULT_FEATURED_LIMIT};
use crate::{Error, Result, Substrate};

const MAX_CONNECTIONS: usize = 100;

/// The product service shared by every connection.
///
/// The mutex makes the daemon the single writer the collection store needs:
/// commands from concurrent connections run one at a time.
pub type SharedService<S> = Arc<Mutex<ProductService<S>>>;

/// Outcome of one protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Line(String),
    Skip,
    Quit,
}

pub struct Router<S> {
    service: SharedService<S>,
    semaphore: Arc<Semaphore>,
}

impl<S: Substrate + 'static> Router<S> {
    pub fn new(service: ProductService<S>) -> Self {
        Self {
            service: Arc::new(Mutex::new(service)),
            semaphore: Arc::new(Semaphore::new(MAX_CONNECTIONS)),
        }
    }

    pub fn service(&self) -> SharedService<S> {
        self.service.clone()
    }

    pub async fn listen(&self, port: &str) -> Result<()> {
        let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
        info!("Army Store listening on port {}", port);

        loop {
            let (socket, peer) = listener.accept().await?;
            let service = self.service.clone();
            let sem = self.semaphore.clone();

            tokio::spawn(async move {
                let _permit = match sem.try_acquire() {
                    Ok(p) => p,
                    Err(_) => {
                        warn!("Server busy: too many concurrent connections. Rejecting {}", peer);
                        let mut socket = socket;
                        if let Err(e) = socket.shutdown().await {
                            error!("Could not close rejected connection {}: {}", peer, e);
                        }
                        return;
                    }
                };

                if let Err(e) = handle_connection(socket, service).await {
                    error!("Connection error: {}", e);
                }
            });
        }
    }
}

pub async fn handle_connection<S: Substrate + 'static>(
    mut socket: TcpStream,
    service: SharedService<S>,
) -> Result<()> {
    let (reader, mut writer) = socket.split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break;
        }

        let service = service.clone();
        let command = line.clone();
        let reply = tokio::task::spawn_blocking(move || dispatch(&service, &command))
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        match reply {
            Reply::Line(response) => {
                writer.write_all(format!("{}\n", response).as_bytes()).await?;
            }
            Reply::Skip => continue,
            Reply::Quit => break,
        }
    }
    Ok(())
}

/// Executes one protocol line against the service.
///
/// Responses are `OK <json>` or `ERR <message>`. Store work is blocking, so
/// call this off the async runtime.
pub fn dispatch<S: Substrate>(service: &Mutex<ProductService<S>>, line: &str) -> Reply {
    let line = line.trim();
    if line.is_empty() {
        return Reply::Skip;
    }
    let (command, args) = line
        .split_once(char::is_whitespace)
        .map(|(c, a)| (c, a.trim()))
        .unwrap_or((line, ""));

    let command = command.to_uppercase();
    match command.as_str() {
        "PING" => return Reply::Line("PONG".to_string()),
        "QUIT" => return Reply::Quit,
        _ => {}
    }

    let service = match service.lock() {
        Ok(guard) => guard,
        Err(_) => return Reply::Line(err("service lock poisoned")),
    };

    let response = match command.as_str() {
        "LIST" => respond(service.get_all_products()),
        "GET" => match args.split_whitespace().next() {
            Some(id) => respond(service.get_product_by_id(id)),
            None => err("missing arguments"),
        },
        "CREATE" => match serde_json::from_str::<Product>(args) {
            Ok(product) => respond(service.create_product(&product)),
            Err(_) => err("invalid json value"),
        },
        "UPDATE" => match args.split_once(char::is_whitespace) {
            None => err("missing arguments"),
            Some((id, patch)) => match serde_json::from_str::<ProductPatch>(patch.trim()) {
                Ok(patch) => respond(service.update_product(id, &patch)),
                Err(_) => err("invalid json value"),
            },
        },
        "DEL" => match args.split_whitespace().next() {
            Some(id) => respond(service.delete_product(id)),
            None => err("missing arguments"),
        },
        "SEARCH" => {
            let criteria = if args.is_empty() {
                Ok(SearchCriteria::default())
            } else {
                serde_json::from_str::<SearchCriteria>(args)
            };
            match criteria {
                Ok(criteria) => respond(service.search_products(&criteria)),
                Err(_) => err("invalid json value"),
            }
        }
        "FEATURED" => {
            let limit = if args.is_empty() {
                Ok(DEFAULT_FEATURED_LIMIT)
            } else {
                args.parse::<usize>()
            };
            match limit {
                Ok(limit) => respond(service.get_featured_products(limit)),
                Err(_) => err("invalid limit"),
            }
        }
        _ => err("unknown command"),
    };

    Reply::Line(response)
}

fn respond<T: Serialize>(result: Result<T>) -> String {
    match result.and_then(|value| Ok(serde_json::to_string(&value)?)) {
        Ok(json) => format!("OK {}", json),
        Err(e) => err(e),
    }
}

fn err(message: impl Display) -> String {
    format!("ERR {}", message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemorySubstrate;
    use serde_json::Value;

    fn service() -> Mutex<ProductService<MemorySubstrate>> {
        Mutex::new(ProductService::open(MemorySubstrate::new()).unwrap())
    }

    fn ok_json(reply: Reply) -> Value {
        match reply {
            Reply::Line(line) => {
                let json = line.strip_prefix("OK ").unwrap_or_else(|| panic!("not OK: {}", line));
                serde_json::from_str(json).unwrap()
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn test_ping_quit_and_blank() {
        let service = service();
        assert_eq!(dispatch(&service, "ping\n"), Reply::Line("PONG".to_string()));
        assert_eq!(dispatch(&service, "QUIT"), Reply::Quit);
        assert_eq!(dispatch(&service, "   \n"), Reply::Skip);
        assert_eq!(
            dispatch(&service, "LAUNCH"),
            Reply::Line("ERR unknown command".to_string())
        );
    }

    #[test]
    fn test_create_update_delete() {
        let service = service();
        let created = ok_json(dispatch(
            &service,
            r#"CREATE {"name":"Botas","price":100000,"stock":5}"#,
        ));
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["featured"], false);

        let updated = ok_json(dispatch(&service, &format!(r#"UPDATE {} {{"featured": true}}"#, id)));
        assert_eq!(updated["featured"], true);
        assert_eq!(updated["id"], id.as_str());

        let featured = ok_json(dispatch(&service, "FEATURED"));
        assert_eq!(featured.as_array().unwrap().len(), 1);

        assert_eq!(ok_json(dispatch(&service, &format!("DEL {}", id))), true);
        assert_eq!(ok_json(dispatch(&service, &format!("DEL {}", id))), false);
        assert_eq!(ok_json(dispatch(&service, &format!("GET {}", id))), Value::Null);
    }

    #[test]
    fn test_validation_error_is_reported() {
        let service = service();
        match dispatch(&service, r#"CREATE {"name":"","price":0}"#) {
            Reply::Line(line) => {
                assert!(line.starts_with("ERR validation failed"), "{}", line);
                assert!(line.contains("name"));
                assert!(line.contains("price"));
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn test_bad_arguments() {
        let service = service();
        let line = |l: &str| dispatch(&service, l);
        assert_eq!(line("GET"), Reply::Line("ERR missing arguments".to_string()));
        assert_eq!(line("DEL  "), Reply::Line("ERR missing arguments".to_string()));
        assert_eq!(line("UPDATE abc"), Reply::Line("ERR missing arguments".to_string()));
        assert_eq!(line("CREATE {"), Reply::Line("ERR invalid json value".to_string()));
        assert_eq!(
            line(r#"UPDATE abc {"id":"x"}"#),
            Reply::Line("ERR invalid json value".to_string())
        );
        assert_eq!(line("FEATURED many"), Reply::Line("ERR invalid limit".to_string()));
        assert_eq!(line(r#"UPDATE abc {"stock":1}"#), Reply::Line("OK null".to_string()));
    }

    #[test]
    fn test_search() {
        let service = service();
        dispatch(&service, r#"CREATE {"name":"Botas","price":300000,"stock":2,"category":"tactical"}"#);
        dispatch(&service, r#"CREATE {"name":"Uniforme","price":120000,"stock":0,"category":"uniform"}"#);

        let all = ok_json(dispatch(&service, "SEARCH"));
        assert_eq!(all.as_array().unwrap().len(), 2);

        let tactical = ok_json(dispatch(&service, r#"SEARCH {"category":"tactical"}"#));
        assert_eq!(tactical[0]["name"], "Botas");

        let in_stock = ok_json(dispatch(&service, r#"SEARCH {"inStock":true,"searchText":"UNI"}"#));
        assert!(in_stock.as_array().unwrap().is_empty());
    }

    #[test]
    fn test_id_is_first_argument_only() {
        let service = service();
        let created = ok_json(dispatch(
            &service,
            r#"CREATE {"name":"Botas","price":100000,"stock":5}"#,
        ));
        let id = created["id"].as_str().unwrap();

        let found = ok_json(dispatch(&service, &format!("GET {} trailing words", id)));
        assert_eq!(found["id"], id);

        assert_eq!(ok_json(dispatch(&service, &format!("DEL {} extra", id))), true);
        assert_eq!(ok_json(dispatch(&service, &format!("GET {}", id))), Value::Null);
    }
}
