use std::env;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub url: Option<String>,
    pub model: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            api_key: None,
            url: None,
            model: None,
        }
    }
}

impl GatewayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("GATEWAY_API_KEY").ok();
        let url = env::var("GATEWAY_URL").ok();
        let model = env::var("GATEWAY_MODEL").ok();

        GatewayConfig {
            api_key,
            url,
            model,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    pub url: Option<String>,
    pub service_key: Option<String>,
    pub generated_bucket: Option<String>,
    pub source_bucket: Option<String>,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        ObjectStoreConfig {
            url: None,
            service_key: None,
            generated_bucket: None,
            source_bucket: None,
        }
    }
}

impl ObjectStoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let url = env::var("STORAGE_URL").ok();
        let service_key = env::var("STORAGE_SERVICE_KEY").ok();
        let generated_bucket = env::var("STORAGE_GENERATED_BUCKET").ok();
        let source_bucket = env::var("STORAGE_SOURCE_BUCKET").ok();

        ObjectStoreConfig {
            url,
            service_key,
            generated_bucket,
            source_bucket,
        }
    }

    pub fn with_credentials(
        mut self,
        url: impl Into<String>,
        service_key: impl Into<String>,
    ) -> Self {
        self.url = Some(url.into());
        self.service_key = Some(service_key.into());
        self
    }

    pub fn with_buckets(
        mut self,
        generated_bucket: impl Into<String>,
        source_bucket: impl Into<String>,
    ) -> Self {
        self.generated_bucket = Some(generated_bucket.into());
        self.source_bucket = Some(source_bucket.into());
        self
    }

    /// Storage is optional: when credentials are absent the proxy falls
    /// back to returning inline-encoded images instead of stored URLs.
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.service_key.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct HistoryStoreConfig {
    pub url: Option<String>,
    pub service_key: Option<String>,
    pub table: Option<String>,
}

impl Default for HistoryStoreConfig {
    fn default() -> Self {
        HistoryStoreConfig {
            url: None,
            service_key: None,
            table: None,
        }
    }
}

impl HistoryStoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let url = env::var("HISTORY_URL").ok();
        let service_key = env::var("HISTORY_SERVICE_KEY").ok();
        let table = env::var("HISTORY_TABLE").ok();

        HistoryStoreConfig {
            url,
            service_key,
            table,
        }
    }

    pub fn with_credentials(
        mut self,
        url: impl Into<String>,
        service_key: impl Into<String>,
    ) -> Self {
        self.url = Some(url.into());
        self.service_key = Some(service_key.into());
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.service_key.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: Option<u16>,
    pub gateway: Option<GatewayConfig>,
    pub objects: Option<ObjectStoreConfig>,
    pub history: Option<HistoryStoreConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: None,
            gateway: None,
            objects: None,
            history: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());

        Config {
            port,
            gateway: Some(GatewayConfig::from_env()),
            objects: Some(ObjectStoreConfig::from_env()),
            history: Some(HistoryStoreConfig::from_env()),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_gateway(mut self, config: GatewayConfig) -> Self {
        self.gateway = Some(config);
        self
    }

    pub fn with_objects(mut self, config: ObjectStoreConfig) -> Self {
        self.objects = Some(config);
        self
    }

    pub fn with_history(mut self, config: HistoryStoreConfig) -> Self {
        self.history = Some(config);
        self
    }
}
