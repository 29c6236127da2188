use std::fs;

use anyhow::Result;
use marquee_fsops::{FsOpsError, list_files, open, resolve};
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

fn namespace() -> Result<(TempDir, std::path::PathBuf)> {
    let temp = TempDir::new()?;
    let root = temp.path().join("downloads");
    fs::create_dir_all(root.join("nested"))?;
    fs::write(root.join("page.html"), "<h1>menu</h1>")?;
    fs::write(root.join("nested").join("inner.txt"), "inner")?;
    fs::write(temp.path().join("secret.txt"), "do not serve")?;
    Ok((temp, root))
}

#[tokio::test]
async fn opens_files_inside_the_root() -> Result<()> {
    let (_temp, root) = namespace()?;
    let mut resource = open("page.html", &root).await?;
    assert_eq!(resource.len, 13);
    let mut body = String::new();
    resource.file.read_to_string(&mut body).await?;
    assert_eq!(body, "<h1>menu</h1>");

    let nested = open("nested/inner.txt", &root).await?;
    assert!(nested.path.ends_with("nested/inner.txt"));
    Ok(())
}

#[tokio::test]
async fn traversal_and_absolute_paths_are_rejected() -> Result<()> {
    let (temp, root) = namespace()?;
    let absolute = temp.path().join("secret.txt").to_string_lossy().into_owned();
    for requested in [
        "../secret.txt",
        "nested/../../secret.txt",
        absolute.as_str(),
    ] {
        let err = open(requested, &root).await.expect_err("escape must fail");
        assert!(
            matches!(err, FsOpsError::PathTraversal { .. }),
            "{requested}: {err:?}"
        );
    }
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn symlinks_leaving_the_root_are_rejected() -> Result<()> {
    let (temp, root) = namespace()?;
    std::os::unix::fs::symlink(temp.path().join("secret.txt"), root.join("escape.txt"))?;
    std::os::unix::fs::symlink(root.join("page.html"), root.join("alias.html"))?;

    let err = open("escape.txt", &root).await.expect_err("symlink escape");
    assert!(matches!(err, FsOpsError::PathTraversal { .. }));

    let alias = open("alias.html", &root).await?;
    assert_eq!(alias.len, 13);
    Ok(())
}

#[tokio::test]
async fn missing_files_and_directories_are_not_found() -> Result<()> {
    let (_temp, root) = namespace()?;
    let err = open("absent.html", &root).await.expect_err("missing");
    assert!(matches!(err, FsOpsError::NotFound { .. }));

    let err = open("nested", &root).await.expect_err("directory");
    assert!(matches!(err, FsOpsError::NotFound { .. }));

    let err = resolve("nested/../", &root).await.expect_err("root itself");
    assert!(matches!(err, FsOpsError::PathTraversal { .. }));
    Ok(())
}

#[tokio::test]
async fn listing_is_sorted() -> Result<()> {
    let (_temp, root) = namespace()?;
    fs::write(root.join("a.html"), "a")?;
    assert_eq!(list_files(&root).await?, ["a.html", "nested", "page.html"]);
    Ok(())
}
