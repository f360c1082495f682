//! Pieces shared by every crate in the workspace: logging setup and the
//! small wire types that do not belong to a single service.

pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn log_format_defaults_to_compact() {
        assert_eq!(utils::logging::LogFormat::parse(None), utils::logging::LogFormat::Compact);
        assert_eq!(utils::logging::LogFormat::parse(Some("JSON")), utils::logging::LogFormat::Json);
        assert_eq!(utils::logging::LogFormat::parse(Some("pretty")), utils::logging::LogFormat::Compact);
    }
}
