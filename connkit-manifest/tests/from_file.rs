use std::io::Write;

use connkit_manifest::{Error, Manifest};

#[test]
fn test_from_file_reads_manifest() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[module]
name = "queue"
type = "crate::Queue"
poolable = true

[module.pooling]
max-active = 2
exhausted-action = "block"

[[operations]]
name = "push"
"#
    )
    .unwrap();

    let manifest = Manifest::from_file(file.path()).unwrap();
    assert!(manifest.module.poolable);
    let pooling = manifest.module.pooling.as_ref().unwrap();
    assert_eq!(pooling.max_active, Some(2));
    assert!(!manifest.has_connect());
}

#[test]
fn test_from_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = Manifest::from_file(dir.path().join("connkit.toml")).unwrap_err();
    assert!(matches!(*err, Error::Io { .. }));
}
