use std::io::Write;

use pretty_assertions::assert_eq;

use super::*;

#[test]
fn empty_document_yields_defaults() {
	let config = Config::from_toml("").unwrap();
	assert_eq!(config, Config::default());
	assert_eq!(config.feed.window, 20);
	assert_eq!(config.mutation.timeout(), Duration::from_secs(10));
}

#[test]
fn partial_sections_keep_other_defaults() {
	let config = Config::from_toml(
		r#"
		[feed]
		supplemental = false

		[mutation]
		timeout_ms = 250
		"#,
	)
	.unwrap();

	assert!(!config.feed.supplemental);
	assert_eq!(config.feed.window, 20);
	assert_eq!(config.feed.fill_below, 20);
	assert_eq!(config.mutation.timeout_ms, 250);
	assert_eq!(config.log.filter, "info");
}

#[test]
fn unknown_keys_are_rejected() {
	let err = Config::from_toml("[feed]\npage_size = 5\n").unwrap_err();
	assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn zero_window_is_invalid() {
	let err = Config::from_toml("[feed]\nwindow = 0\n").unwrap_err();
	assert!(matches!(err, ConfigError::Invalid { field: "feed.window", .. }));
}

#[test]
fn zero_timeout_is_invalid() {
	let err = Config::from_toml("[mutation]\ntimeout_ms = 0\n").unwrap_err();
	assert!(matches!(err, ConfigError::Invalid { field: "mutation.timeout_ms", .. }));
}

#[test]
fn load_reads_file() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(file, "[log]\nfilter = \"cairn_core=debug\"").unwrap();

	let config = Config::load(file.path()).unwrap();
	assert_eq!(config.log.filter, "cairn_core=debug");
}

#[test]
fn explicit_missing_path_is_an_error() {
	let dir = tempfile::tempdir().unwrap();
	let missing = dir.path().join("nope.toml");

	let err = Config::load_or_default(Some(&missing)).unwrap_err();
	assert!(matches!(err, ConfigError::Io { .. }));
}
