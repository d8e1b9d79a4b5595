//! End-to-end CLI scenarios, driving the built `repose` binary directly
//! rather than calling `repose-repo::Driver` in-process: building a pool,
//! running the binary, and asserting on the resulting index and links.

use std::fs::{self, File};
use std::path::Path;

use assert_cmd::Command;
use predicates::str::contains;
use repose_compress::CompressionKind;
use repose_compress::tarball::TarballBuilder;
use tempfile::tempdir;
use testresult::TestResult;

fn write_pool_package(dir: &Path, name: &str, version: &str, arch: &str) -> TestResult {
    let filename = format!("{name}-{version}-{arch}.pkg.tar");
    let mut builder = TarballBuilder::new(File::create(dir.join(&filename))?, CompressionKind::None)?;
    let pkginfo = format!("pkgname = {name}\npkgver = {version}\narch = {arch}\n");
    let mut header = tar::Header::new_gnu();
    header.set_size(pkginfo.len() as u64);
    header.set_cksum();
    builder.inner_mut().append_data(&mut header, ".PKGINFO", pkginfo.as_bytes())?;
    builder.finish()?;
    Ok(())
}

#[test]
fn first_run_writes_gzip_db_and_exits_success() -> TestResult {
    let pool = tempdir()?;
    write_pool_package(pool.path(), "a", "1-1", "x86_64")?;

    let mut cmd = Command::cargo_bin("repose")?;
    cmd.arg("-p").arg(pool.path()).arg("-r").arg(pool.path()).arg("-m").arg("x86_64").arg("a");
    cmd.assert().success();

    assert!(pool.path().join("a.db").exists());
    assert!(pool.path().join("a-1-1-x86_64.pkg.tar").exists());
    Ok(())
}

#[test]
fn second_run_is_a_no_op_and_still_exits_success() -> TestResult {
    let pool = tempdir()?;
    write_pool_package(pool.path(), "a", "1-1", "x86_64")?;

    for _ in 0..2 {
        let mut cmd = Command::cargo_bin("repose")?;
        cmd.arg("-p").arg(pool.path()).arg("-r").arg(pool.path()).arg("-m").arg("x86_64").arg("a");
        cmd.assert().success();
    }

    assert!(pool.path().join("a.db").exists());
    Ok(())
}

#[test]
fn drop_empties_repo_but_still_exits_success() -> TestResult {
    let pool = tempdir()?;
    write_pool_package(pool.path(), "a", "1-1", "x86_64")?;

    let mut cmd = Command::cargo_bin("repose")?;
    cmd.arg("-p").arg(pool.path()).arg("-r").arg(pool.path()).arg("-m").arg("x86_64").arg("a");
    cmd.assert().success();
    assert!(pool.path().join("a-1-1-x86_64.pkg.tar").exists());

    let mut drop_cmd = Command::cargo_bin("repose")?;
    drop_cmd
        .arg("-p")
        .arg(pool.path())
        .arg("-r")
        .arg(pool.path())
        .arg("-m")
        .arg("x86_64")
        .arg("--drop")
        .arg("a")
        .arg("a");
    drop_cmd.assert().success();

    assert!(!pool.path().join("a-1-1-x86_64.pkg.tar").exists());
    Ok(())
}

#[test]
fn arch_mismatch_leaves_repo_empty_and_exits_nonzero() -> TestResult {
    let pool = tempdir()?;
    write_pool_package(pool.path(), "a", "1-1", "i686")?;

    let mut cmd = Command::cargo_bin("repose")?;
    cmd.arg("-p").arg(pool.path()).arg("-r").arg(pool.path()).arg("-m").arg("x86_64").arg("a");
    cmd.assert().code(1);
    Ok(())
}

#[test]
fn manifest_supplies_targets_when_none_given_on_the_command_line() -> TestResult {
    let pool = tempdir()?;
    write_pool_package(pool.path(), "a", "1-1", "x86_64")?;
    write_pool_package(pool.path(), "b", "1-1", "x86_64")?;
    fs::write(pool.path().join("a.manifest"), "a\n")?;

    let mut cmd = Command::cargo_bin("repose")?;
    cmd.arg("-p").arg(pool.path()).arg("-r").arg(pool.path()).arg("-m").arg("x86_64").arg("a");
    cmd.assert().success();

    assert!(pool.path().join("a-1-1-x86_64.pkg.tar").exists());
    assert!(!pool.path().join("b-1-1-x86_64.pkg.tar").exists());
    Ok(())
}

#[test]
fn sign_without_a_configured_backend_is_a_fatal_error() -> TestResult {
    let pool = tempdir()?;
    write_pool_package(pool.path(), "a", "1-1", "x86_64")?;

    let mut cmd = Command::cargo_bin("repose")?;
    cmd.arg("-p")
        .arg(pool.path())
        .arg("-r")
        .arg(pool.path())
        .arg("-m")
        .arg("x86_64")
        .arg("--sign")
        .arg("a");
    cmd.assert()
        .failure()
        .stderr(contains("signing backend not configured"));
    Ok(())
}

#[test]
fn explicit_command_line_targets_override_the_manifest() -> TestResult {
    let pool = tempdir()?;
    write_pool_package(pool.path(), "a", "1-1", "x86_64")?;
    write_pool_package(pool.path(), "b", "1-1", "x86_64")?;
    fs::write(pool.path().join("a.manifest"), "a\n")?;

    let mut cmd = Command::cargo_bin("repose")?;
    cmd.arg("-p").arg(pool.path()).arg("-r").arg(pool.path()).arg("-m").arg("x86_64").arg("a").arg("b");
    cmd.assert().success();

    assert!(pool.path().join("b-1-1-x86_64.pkg.tar").exists());
    Ok(())
}
