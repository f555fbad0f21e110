use std::path::Path;

use barangay_bounds::config::Config;
use barangay_bounds::AreaTable;

#[test]
fn test_example_config_matches_builtin_table() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.example.toml");
    let config = Config::load_from_file(&path).unwrap();

    assert_eq!(config.area_table().unwrap(), AreaTable::koronadal());
    assert_eq!(config.server.listen, "0.0.0.0:5173");

    let proxy = config.server.proxy.as_ref().unwrap();
    assert_eq!(proxy.target, "http://127.0.0.1:8000");
    assert!(proxy.strip_prefix);
}

#[test]
fn test_missing_config_file_is_error() {
    let err = Config::load_from_file("does/not/exist.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_resolver_from_config_uses_region_half_width() {
    let config = Config::default();
    let resolver = config.build_resolver().unwrap();
    assert_eq!(resolver.half_width(), config.region.half_width);
    assert_eq!(resolver.areas().region(), "Koronadal");
}
