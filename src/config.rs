/// 환경 변수 기반 설정
// region:    --- Imports
use crate::error::{Result, SettlementError};
use std::time::Duration;
// endregion: --- Imports

// region:    --- Config
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    /// 시작할 때 모든 정산 테이블을 지우고 다시 만든다
    pub database_reset: bool,
    pub kafka_brokers: String,
    pub kafka_group_id: String,
    pub scheduler_interval: Duration,
}

impl Config {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로부터 설정 생성 (테스트에서 환경 변수 대신 사용)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| SettlementError::Config("DATABASE_URL must be set".to_string()))?;

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;
        let database_reset = parse_or(&lookup, "DATABASE_RESET", false)?;
        let interval_secs: u64 = parse_or(&lookup, "SCHEDULER_INTERVAL_SECS", 60)?;
        if interval_secs == 0 {
            return Err(SettlementError::Config(
                "SCHEDULER_INTERVAL_SECS must be positive".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            database_reset,
            kafka_brokers: lookup("KAFKA_BROKERS").unwrap_or_else(|| "localhost:9092".to_string()),
            kafka_group_id: lookup("KAFKA_GROUP_ID")
                .unwrap_or_else(|| "settlement-group".to_string()),
            scheduler_interval: Duration::from_secs(interval_secs),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SettlementError::Config(format!("{} 값이 올바르지 않습니다: {}", key, raw))),
        None => Ok(default),
    }
}
// endregion: --- Config

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")])).unwrap();
        assert_eq!(config.kafka_brokers, "localhost:9092");
        assert_eq!(config.kafka_group_id, "settlement-group");
        assert_eq!(config.database_max_connections, 5);
        assert!(!config.database_reset);
        assert_eq!(config.scheduler_interval, Duration::from_secs(60));
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err.code(), "CONFIG");
    }

    #[test]
    fn reset_flag_must_be_a_bool() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("DATABASE_RESET", "true"),
        ]))
        .unwrap();
        assert!(config.database_reset);

        let bad = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("DATABASE_RESET", "yes"),
        ]));
        assert_eq!(bad.unwrap_err().code(), "CONFIG");
    }

    #[test]
    fn rejects_unparsable_and_zero_interval() {
        let bad = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("SCHEDULER_INTERVAL_SECS", "soon"),
        ]));
        assert!(bad.is_err());

        let zero = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("SCHEDULER_INTERVAL_SECS", "0"),
        ]));
        assert!(zero.is_err());
    }
}
