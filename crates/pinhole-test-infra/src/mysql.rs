use crate::Result;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const MYSQL_PORT: u16 = 3306;

#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "8.4".to_string(), setter(into))]
    tag: String,
    #[builder(default = "pinhole".to_string(), setter(into))]
    database: String,
    #[builder(default = "pinhole".to_string(), setter(into))]
    username: String,
    #[builder(default = "pinhole".to_string(), setter(into))]
    password: String,
    #[builder(default = "root".to_string(), setter(into))]
    root_password: String,
}

/// A disposable MySQL server for storage integration tests.
///
/// The container is stopped when the value is dropped.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    pub async fn start(config: MysqlConfig) -> Result<Self> {
        let container = GenericImage::new("mysql", config.tag.as_str())
            .with_exposed_port(MYSQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", config.database.as_str())
            .with_env_var("MYSQL_USER", config.username.as_str())
            .with_env_var("MYSQL_PASSWORD", config.password.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", config.root_password.as_str())
            .start()
            .await?;

        Ok(Self { container, config })
    }

    async fn endpoint(&self) -> Result<(String, u16)> {
        let host = self.container.get_host().await?.to_string();
        let port = self.container.get_host_port_ipv4(MYSQL_PORT).await?;
        Ok((host, port))
    }

    /// Connection URL for the application user.
    pub async fn database_url(&self) -> Result<String> {
        let (host, port) = self.endpoint().await?;
        Ok(format!(
            "mysql://{}:{}@{}:{}/{}",
            self.config.username, self.config.password, host, port, self.config.database
        ))
    }

    /// Connection URL for the root user, for schema setup.
    pub async fn root_url(&self) -> Result<String> {
        let (host, port) = self.endpoint().await?;
        Ok(format!(
            "mysql://root:{}@{}:{}/{}",
            self.config.root_password, host, port, self.config.database
        ))
    }
}
