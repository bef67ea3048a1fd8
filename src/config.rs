// ⚙️ Configuration - command line / environment → typed config

use crate::error::QueryResult;
use crate::pagination::ZeroPerPage;
use crate::service::QueryService;
use crate::store::TableStore;
use clap::{Args, Parser};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_DATA_PATH: &str = "data/churn_sample.csv";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5001";

/// Where the source table comes from.
#[derive(Debug, Clone, Args)]
pub struct DataArgs {
    /// Path to the churn CSV file.
    #[arg(long, env = "CHURN_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    /// Fail requests with per_page=0 instead of returning an empty page.
    #[arg(long)]
    pub reject_zero_per_page: bool,
}

/// HTTP server command line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "churn-server")]
#[command(about = "HTTP API over the customer churn dataset")]
pub struct ServerArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Address to listen on.
    #[arg(short, long, env = "CHURN_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: String,
}

/// Dataset configuration shared by the CLI and the server.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub data_path: PathBuf,
    pub zero_per_page: ZeroPerPage,
}

impl From<&DataArgs> for DataConfig {
    fn from(args: &DataArgs) -> Self {
        Self {
            data_path: args.data.clone(),
            zero_per_page: if args.reject_zero_per_page {
                ZeroPerPage::Reject
            } else {
                ZeroPerPage::Empty
            },
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            zero_per_page: ZeroPerPage::default(),
        }
    }
}

impl DataConfig {
    /// Load the dataset once and wrap it for sharing. Errors here are fatal.
    pub fn load_service(&self) -> QueryResult<QueryService> {
        let store = TableStore::load(&self.data_path)?;
        Ok(QueryService::new(Arc::new(store)).with_zero_per_page(self.zero_per_page))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub data: DataConfig,
    pub listen_addr: String,
}

impl From<&ServerArgs> for ServerConfig {
    fn from(args: &ServerArgs) -> Self {
        Self {
            data: DataConfig::from(&args.data),
            listen_addr: args.listen.clone(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_args() {
        let args = ServerArgs::parse_from([
            "churn-server",
            "--data",
            "/tmp/churn.csv",
            "--listen",
            "127.0.0.1:9000",
            "--reject-zero-per-page",
        ]);

        let config = ServerConfig::from(&args);

        assert_eq!(config.data.data_path, PathBuf::from("/tmp/churn.csv"));
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.data.zero_per_page, ZeroPerPage::Reject);
    }

    #[test]
    fn test_load_service_from_shipped_sample() {
        let config = DataConfig {
            data_path: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_DATA_PATH),
            ..DataConfig::default()
        };

        let service = config.load_service().unwrap();

        assert_eq!(service.list_reports().available_reports.len(), 5);
        assert!(service.get_customer(15634602).is_ok());
    }

    #[test]
    fn test_load_service_missing_file_is_fatal() {
        let config = DataConfig {
            data_path: PathBuf::from("/nonexistent/churn.csv"),
            ..DataConfig::default()
        };

        let err = config.load_service().unwrap_err();

        assert!(err.is_fatal());
    }
}
