use std::path::{Path, PathBuf};

use taskpipe::fs::{FileSystem, MockFileSystem, RealFileSystem};

#[test]
fn mock_fs_treats_dot_prefixes_as_the_same_file() {
    let fs = MockFileSystem::new();
    fs.add_file("./src/main.scss", b"a{}".to_vec());

    assert!(fs.is_file(Path::new("src/main.scss")));
    assert_eq!(fs.read(Path::new("./src/main.scss")).unwrap(), b"a{}");
}

#[test]
fn mock_fs_implies_directories_from_files() {
    let fs = MockFileSystem::new();
    fs.add_file("site/assets/js/a.js", "a");
    fs.add_file("site/assets/js/vendors/v.js", "v");
    fs.add_file("site/README.md", "r");

    assert!(fs.is_dir(Path::new("site/assets")));
    assert!(!fs.is_dir(Path::new("site/README.md")));
    assert!(fs.exists(Path::new("site/assets/js/vendors")));
    assert_eq!(
        fs.read_dir(Path::new("site/assets/js")).unwrap(),
        vec![
            PathBuf::from("site/assets/js/a.js"),
            PathBuf::from("site/assets/js/vendors"),
        ]
    );
    assert!(fs.read_dir(Path::new("site/missing")).is_err());
}

#[test]
fn mock_fs_rename_and_remove() {
    let fs = MockFileSystem::new();
    fs.write(Path::new("out/.a.txt.taskpipe-tmp"), b"x").unwrap();
    fs.rename(Path::new("out/.a.txt.taskpipe-tmp"), Path::new("out/a.txt"))
        .unwrap();

    assert_eq!(fs.paths(), vec![PathBuf::from("out/a.txt")]);
    fs.remove_file(Path::new("out/a.txt")).unwrap();
    assert!(fs.paths().is_empty());
    assert!(fs.remove_file(Path::new("out/a.txt")).is_err());
}

#[test]
fn mock_fs_can_fail_writes() {
    let fs = MockFileSystem::new();
    fs.fail_writes_to("out/a.txt");

    assert!(fs.write(Path::new("out/a.txt"), b"x").is_err());
    assert!(fs.writes().is_empty());
    fs.write(Path::new("out/b.txt"), b"y").unwrap();
    assert_eq!(fs.writes(), vec![PathBuf::from("out/b.txt")]);
}

#[test]
fn real_fs_write_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("deep/nested/file.css");

    RealFileSystem.write(&target, b"a{}").unwrap();

    assert!(RealFileSystem.is_file(&target));
    assert!(RealFileSystem.is_dir(&dir.path().join("deep/nested")));
    assert_eq!(RealFileSystem.read(&target).unwrap(), b"a{}");
    let listed = RealFileSystem.read_dir(&dir.path().join("deep")).unwrap();
    assert_eq!(listed, vec![dir.path().join("deep/nested")]);
}
