//! 配置源地址解析

use config_abstractions::{ConnectionDescriptor, ContentFormat, DEFAULT_CLUSTER, DEFAULT_NAMESPACE};
use infrastructure_common::{ConfigError, ConfigResult};
use secrecy::SecretString;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

/// 地址查询参数名
pub mod params {
    pub const CONFIG_KEY: &str = "configKey";
    pub const CONFIG_TYPE: &str = "configType";
    pub const NAMESPACE: &str = "namespaceName";
    pub const APP_ID: &str = "appId";
    pub const CLUSTER: &str = "cluster";
    pub const SECRET: &str = "secret";
    pub const ACCESS_KEY_SECRET: &str = "accesskeySecret";
    pub const CACHE_DIR: &str = "cacheDir";
}

/// 解析配置源地址
///
/// 地址形如 `scheme://host[:port]/path?configKey=..&configType=..&appId=..`，
/// 主机部分是远程服务地址，其余连接信息放在查询参数中。
/// 纯函数，不产生任何副作用。
pub fn parse_source_uri(source_uri: &str) -> ConfigResult<ConnectionDescriptor> {
    let url = Url::parse(source_uri)
        .map_err(|e| ConfigError::invalid_uri(source_uri, e.to_string()))?;

    let endpoint = endpoint_of(&url)
        .ok_or_else(|| ConfigError::invalid_uri(source_uri, "缺少远程服务地址"))?;

    // 与常见 URL 库一致，同名参数取第一个
    let mut query: HashMap<String, String> = HashMap::new();
    for (name, value) in url.query_pairs() {
        query.entry(name.into_owned()).or_insert_with(|| value.into_owned());
    }
    // 空白值视为缺失，非空值按解码后的原样保存
    let param = |name: &str| {
        query
            .get(name)
            .filter(|value| !value.trim().is_empty())
            .cloned()
    };

    let config_key = param(params::CONFIG_KEY).ok_or(ConfigError::MissingParameter {
        name: params::CONFIG_KEY,
    })?;
    let content_format = param(params::CONFIG_TYPE)
        .and_then(|tag| ContentFormat::from_tag(&tag))
        .ok_or(ConfigError::MissingParameter {
            name: params::CONFIG_TYPE,
        })?;
    let application_id = param(params::APP_ID).ok_or(ConfigError::MissingParameter {
        name: params::APP_ID,
    })?;

    let access_secret = param(params::SECRET)
        .or_else(|| param(params::ACCESS_KEY_SECRET))
        .map(SecretString::new);

    let descriptor = ConnectionDescriptor {
        scheme: url.scheme().to_string(),
        endpoint,
        application_id,
        cluster: param(params::CLUSTER).unwrap_or_else(|| DEFAULT_CLUSTER.to_string()),
        namespace: param(params::NAMESPACE).unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
        config_key,
        access_secret,
        content_format,
        cache_directory: param(params::CACHE_DIR).map(PathBuf::from),
    };

    debug!(
        "解析配置源地址: endpoint={}, app_id={}, cluster={}, namespace={}, key={}, format={}",
        descriptor.endpoint,
        descriptor.application_id,
        descriptor.cluster,
        descriptor.namespace,
        descriptor.config_key,
        descriptor.content_format
    );
    Ok(descriptor)
}

/// 提取 `host[:port]`
fn endpoint_of(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|host| !host.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
