use std::fs;

use phalanx::config::{BitSamplingConfig, HashingConfig, LshConfig, PhalanxConfig};
use phalanx::error::{PhalanxError, Result};
use phalanx::hashing::{HashAlgorithm, HashFamilies, HashFunctionFamily};
use tempfile::TempDir;

fn shape() -> HashingConfig {
    HashingConfig {
        bit_sampling: BitSamplingConfig {
            bits: 12,
            num_functions: 10,
            dimension: 32,
        },
        lsh: LshConfig {
            num_functions: 5,
            bin_width: 10.0,
            dimension: 32,
        },
        ..HashingConfig::default()
    }
}

fn write_resources(dir: &TempDir, config: &HashingConfig) -> Result<()> {
    for (algorithm, name) in [
        (HashAlgorithm::BitSampling, &config.bit_sampling_file),
        (HashAlgorithm::Lsh, &config.lsh_file),
    ] {
        let family = HashFunctionFamily::generate(algorithm, config, 11);
        fs::write(dir.path().join(name), family.to_bytes()?)?;
    }
    Ok(())
}

#[test]
fn resources_load_from_configured_directory() -> Result<()> {
    let dir = TempDir::new()?;
    let config = HashingConfig {
        resource_dir: Some(dir.path().to_path_buf()),
        ..shape()
    };
    write_resources(&dir, &config)?;

    let families = HashFamilies::load(&config);
    assert_eq!(families.available(), HashAlgorithm::ALL.to_vec());

    let bits = families.get(HashAlgorithm::BitSampling)?;
    assert_eq!(bits.num_functions(), 10);
    assert_eq!(bits.dimension(), 32);
    for code in bits.generate_hashes(&[1.0; 32])? {
        assert!((0..4096).contains(&code));
    }
    assert_eq!(families.get(HashAlgorithm::Lsh)?.generate_hashes(&[1.0; 20])?.len(), 5);
    Ok(())
}

#[test]
fn corrupt_resource_disables_only_its_family() -> Result<()> {
    let dir = TempDir::new()?;
    let config = HashingConfig {
        resource_dir: Some(dir.path().to_path_buf()),
        ..shape()
    };
    write_resources(&dir, &config)?;

    let path = dir.path().join(&config.lsh_file);
    let mut bytes = fs::read(&path)?;
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xff;
    fs::write(&path, bytes)?;

    let families = HashFamilies::load(&config);
    assert!(families.is_available(HashAlgorithm::BitSampling));
    assert!(!families.is_available(HashAlgorithm::Lsh));
    assert!(matches!(
        families.get(HashAlgorithm::Lsh),
        Err(PhalanxError::Configuration(_))
    ));
    Ok(())
}

#[test]
fn missing_resource_disables_only_its_family() -> Result<()> {
    let dir = TempDir::new()?;
    let config = HashingConfig {
        resource_dir: Some(dir.path().to_path_buf()),
        ..shape()
    };
    write_resources(&dir, &config)?;
    fs::remove_file(dir.path().join(&config.bit_sampling_file))?;

    let families = HashFamilies::load(&config);
    assert_eq!(families.available(), vec![HashAlgorithm::Lsh]);
    Ok(())
}

#[test]
fn configuration_file_points_at_resources() -> Result<()> {
    let dir = TempDir::new()?;
    let config_path = dir.path().join("phalanx.json");
    fs::write(
        &config_path,
        format!(
            r#"{{
                "hashing": {{"resource_dir": {:?}, "lsh_file": "lsh.bin"}},
                "search": {{"thread_pool_size": 2}}
            }}"#,
            dir.path().display().to_string()
        ),
    )?;

    let config = PhalanxConfig::from_file(&config_path)?;
    assert_eq!(config.hashing.lsh_path(), Some(dir.path().join("lsh.bin")));
    assert_eq!(config.search.thread_pool_size, Some(2));
    assert_eq!(config.hashing.bit_sampling.num_functions, 100);

    // Nothing was written yet: both families are unavailable.
    let families = HashFamilies::load(&config.hashing);
    assert!(families.available().is_empty());
    Ok(())
}
