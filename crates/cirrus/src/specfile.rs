//! Resource spec file loading
//!
//! Spec files are YAML documents listing resources:
//!
//! ```yaml
//! resources:
//!   - id: network
//!     kind: network
//!     region: eastus
//!     properties:
//!       address_space: 10.10.0.0/16
//!   - id: lb
//!     kind: load-balancer
//!     region: eastus
//!     depends_on: [network]
//! ```

use anyhow::Context;
use cirrus_core::{ResourceSpec, SpecSet};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct SpecFile {
    resources: Vec<ResourceSpec>,
}

/// Load and validate a spec file into a [`SpecSet`]
pub fn load(path: &Path) -> anyhow::Result<SpecSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read spec file: {}", path.display()))?;
    let file: SpecFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse spec file: {}", path.display()))?;
    let specs = SpecSet::new(file.resources)
        .with_context(|| format!("Invalid spec file: {}", path.display()))?;
    tracing::debug!(resources = specs.len(), "Loaded spec file");
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_vmss_topology() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
resources:
  - id: network
    kind: network
    region: eastus
    properties:
      address_space: 10.10.0.0/16
  - id: ip
    kind: public-ip
    region: eastus
  - id: lb
    kind: load-balancer
    region: eastus
    depends_on: [network, ip]
  - id: scaleset
    kind: scale-set
    region: eastus
    properties:
      capacity: 3
    depends_on: [network, lb]
"#
        )
        .unwrap();

        let specs = load(file.path()).unwrap();
        assert_eq!(specs.len(), 4);
        let scaleset = specs.get("scaleset").unwrap();
        assert_eq!(scaleset.get_property::<u32>("capacity"), Some(3));
        assert!(scaleset.depends_on.contains("lb"));
    }

    #[test]
    fn test_dangling_dependency_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
resources:
  - id: lb
    kind: load-balancer
    region: eastus
    depends_on: [missing]
"#
        )
        .unwrap();

        assert!(load(file.path()).is_err());
    }
}
