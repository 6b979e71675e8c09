//! Provider selection: builds the configured completion provider.

use std::sync::Arc;
use fieldhand_config::AppConfig;
use fieldhand_core::error::ProviderError;
use fieldhand_core::provider::Provider;
use tracing::info;
use crate::openai_compat::OpenAiCompatProvider;

const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";

/// Build the provider named by `config.provider`.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.provider.as_str();
    let provider_config = config.providers.get(name);

    let api_key = provider_config
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone())
        .unwrap_or_default();

    let provider: Arc<dyn Provider> = if name == "azure" {
        let endpoint = provider_config
            .and_then(|p| p.api_url.clone())
            .ok_or_else(|| {
                ProviderError::NotConfigured(
                    "azure provider needs an endpoint (AZURE_OPENAI_API_BASE)".into(),
                )
            })?;
        let version = provider_config
            .and_then(|p| p.api_version.clone())
            .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.into());
        Arc::new(OpenAiCompatProvider::azure(endpoint, api_key, version))
    } else {
        let base_url = match provider_config.and_then(|p| p.api_url.clone()) {
            Some(url) => url,
            None => default_base_url(name).ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "unknown provider '{name}': add [providers.{name}] api_url to config.toml"
                ))
            })?,
        };
        Arc::new(OpenAiCompatProvider::new(name, base_url, api_key))
    };

    info!(provider = name, "Completion provider ready");
    Ok(provider)
}

/// The model name to send: Azure requests address the deployment.
pub fn resolve_model(config: &AppConfig) -> String {
    config
        .providers
        .get(&config.provider)
        .and_then(|p| p.deployment.clone())
        .unwrap_or_else(|| config.model.clone())
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "vllm" => "http://localhost:8000/v1",
        _ => return None,
    };
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldhand_config::ProviderConfig;

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").unwrap().contains("openrouter.ai"));
        assert!(default_base_url("openai").unwrap().contains("api.openai.com"));
        assert!(default_base_url("ollama").unwrap().contains("localhost:11434"));
        assert!(default_base_url("mystery").is_none());
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn azure_without_endpoint_is_not_configured() {
        let config = AppConfig {
            provider: "azure".into(),
            ..AppConfig::default()
        };
        let err = build_from_config(&config).err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn azure_deployment_overrides_model() {
        let mut config = AppConfig {
            provider: "azure".into(),
            ..AppConfig::default()
        };
        config.providers.insert(
            "azure".into(),
            ProviderConfig {
                api_url: Some("https://farm.openai.azure.com".into()),
                deployment: Some("gpt4o-farm".into()),
                ..ProviderConfig::default()
            },
        );
        assert_eq!(build_from_config(&config).unwrap().name(), "azure");
        assert_eq!(resolve_model(&config), "gpt4o-farm");
    }

    #[test]
    fn custom_provider_uses_configured_url() {
        let mut config = AppConfig {
            provider: "farmlab".into(),
            ..AppConfig::default()
        };
        config.providers.insert(
            "farmlab".into(),
            ProviderConfig {
                api_url: Some("http://10.0.0.5:8080/v1".into()),
                ..ProviderConfig::default()
            },
        );
        assert_eq!(build_from_config(&config).unwrap().name(), "farmlab");
        assert_eq!(resolve_model(&config), config.model);
    }
}
