use thiserror::Error;

pub const ENV_PREFIX: &str = "COLLOQUY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: set {env_var} or add it to the config file")]
    MissingEnvVar { env_var: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Environment variable that sets a dotted configuration key
pub fn to_env_var(field: &str) -> String {
    format!("{}_{}", ENV_PREFIX, field.replace('.', "__").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var() {
        assert_eq!(to_env_var("provider.type"), "COLLOQUY_PROVIDER__TYPE");
        assert_eq!(to_env_var("news.api_key"), "COLLOQUY_NEWS__API_KEY");
        assert_eq!(to_env_var("turns"), "COLLOQUY_TURNS");
    }
}
