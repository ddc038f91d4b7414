//! Descriptor and package builders for creating test fixtures
//!
//! Builders render descriptors through `serde_json::Value` so identifier
//! fields are always emitted as YAML strings.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use serde_json::{json, Value};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

pub const VENDOR: &str = "eu.sonata-nfv";
pub const VERSION: &str = "0.1";

pub const SERVICE_CONTENT_TYPE: &str = "application/sonata.service_descriptor";
pub const FUNCTION_CONTENT_TYPE: &str = "application/sonata.function_descriptor";

fn to_yaml(value: &Value) -> String {
    serde_yaml_ng::to_string(value).expect("fixture serializes to YAML")
}

fn connection_points(ids: &[String]) -> Value {
    Value::Array(ids.iter().map(|id| json!({ "id": id })).collect())
}

fn virtual_links(links: &[(String, String, Vec<String>)]) -> Value {
    Value::Array(
        links
            .iter()
            .map(|(id, connectivity, refs)| {
                json!({
                    "id": id,
                    "connectivity_type": connectivity,
                    "connection_points_reference": refs,
                })
            })
            .collect(),
    )
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Builder for function descriptor fixtures
#[derive(Debug, Clone)]
pub struct FunctionBuilder {
    name: String,
    version: String,
    ports: Vec<String>,
    units: Vec<(String, Vec<String>)>,
    links: Vec<(String, String, Vec<String>)>,
}

impl FunctionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: VERSION.to_string(),
            ports: Vec::new(),
            units: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Function with ports `in` and `out` wired through one unit
    pub fn pass_through(name: &str) -> Self {
        Self::new(name)
            .with_ports(&["in", "out"])
            .with_unit("vdu01", &["eth0", "eth1"])
            .with_link("in-link", "E-Line", &["in", "vdu01:eth0"])
            .with_link("out-link", "E-Line", &["vdu01:eth1", "out"])
    }

    /// Function with a single port `m1` attached to its unit
    pub fn single_port(name: &str) -> Self {
        Self::new(name)
            .with_ports(&["m1"])
            .with_unit("vdu01", &["eth0"])
            .with_link("m1-link", "E-Line", &["m1", "vdu01:eth0"])
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn with_ports(mut self, ports: &[&str]) -> Self {
        self.ports.extend(strings(ports));
        self
    }

    pub fn with_unit(mut self, id: &str, ports: &[&str]) -> Self {
        self.units.push((id.to_string(), strings(ports)));
        self
    }

    pub fn with_link(mut self, id: &str, connectivity: &str, refs: &[&str]) -> Self {
        self.links
            .push((id.to_string(), connectivity.to_string(), strings(refs)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical identifier `vendor.name.version`
    pub fn id(&self) -> String {
        format!("{}.{}.{}", VENDOR, self.name, self.version)
    }

    pub fn to_value(&self) -> Value {
        json!({
            "descriptor_version": "vnfd-schema-01",
            "vendor": VENDOR,
            "name": self.name,
            "version": self.version,
            "connection_points": connection_points(&self.ports),
            "virtual_deployment_units": self.units.iter().map(|(id, ports)| json!({
                "id": id,
                "vm_image": format!("file:///images/{}.qcow2", self.name),
                "connection_points": connection_points(ports),
            })).collect::<Vec<_>>(),
            "virtual_links": virtual_links(&self.links),
        })
    }

    pub fn to_yaml(&self) -> String {
        to_yaml(&self.to_value())
    }
}

/// Builder for service descriptor fixtures
#[derive(Debug, Clone)]
pub struct ServiceBuilder {
    name: String,
    version: String,
    functions: Vec<(String, String, String)>,
    ports: Vec<String>,
    links: Vec<(String, String, Vec<String>)>,
    paths: Vec<(String, Vec<(String, u32)>)>,
    extra_constituents: Vec<String>,
}

impl ServiceBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: VERSION.to_string(),
            functions: Vec::new(),
            ports: Vec::new(),
            links: Vec::new(),
            paths: Vec::new(),
            extra_constituents: Vec::new(),
        }
    }

    /// Reference function `name` at the default version as `vnf_id`
    pub fn with_function(self, vnf_id: &str, name: &str) -> Self {
        self.with_function_version(vnf_id, name, VERSION)
    }

    pub fn with_function_version(mut self, vnf_id: &str, name: &str, version: &str) -> Self {
        self.functions
            .push((vnf_id.to_string(), name.to_string(), version.to_string()));
        self
    }

    pub fn with_ports(mut self, ports: &[&str]) -> Self {
        self.ports.extend(strings(ports));
        self
    }

    pub fn with_link(mut self, id: &str, connectivity: &str, refs: &[&str]) -> Self {
        self.links
            .push((id.to_string(), connectivity.to_string(), strings(refs)));
        self
    }

    /// Add a forwarding path to the service's forwarding graph
    pub fn with_path(mut self, fp_id: &str, points: &[(&str, u32)]) -> Self {
        self.paths.push((
            fp_id.to_string(),
            points.iter().map(|(r, p)| (r.to_string(), *p)).collect(),
        ));
        self
    }

    /// Name a vnf in the forwarding graph that the service does not declare
    pub fn with_constituent(mut self, vnf_id: &str) -> Self {
        self.extra_constituents.push(vnf_id.to_string());
        self
    }

    pub fn id(&self) -> String {
        format!("{}.{}.{}", VENDOR, self.name, self.version)
    }

    pub fn to_value(&self) -> Value {
        let mut constituent_vnfs: Vec<String> =
            self.functions.iter().map(|(vnf_id, _, _)| vnf_id.clone()).collect();
        constituent_vnfs.extend(self.extra_constituents.iter().cloned());

        let forwarding_graphs = if self.paths.is_empty() {
            json!([])
        } else {
            json!([{
                "fg_id": "fg01",
                "number_of_endpoints": self.ports.len(),
                "number_of_virtual_links": self.links.len(),
                "constituent_vnfs": constituent_vnfs,
                "constituent_virtual_links": self.links.iter().map(|(id, _, _)| id.clone()).collect::<Vec<_>>(),
                "network_forwarding_paths": self.paths.iter().map(|(fp_id, points)| json!({
                    "fp_id": fp_id,
                    "policy": "none",
                    "connection_points": points.iter().map(|(r, p)| json!({
                        "connection_point_ref": r,
                        "position": p,
                    })).collect::<Vec<_>>(),
                })).collect::<Vec<_>>(),
            }])
        };

        json!({
            "descriptor_version": "1.0",
            "vendor": VENDOR,
            "name": self.name,
            "version": self.version,
            "network_functions": self.functions.iter().map(|(vnf_id, name, version)| json!({
                "vnf_id": vnf_id,
                "vnf_vendor": VENDOR,
                "vnf_name": name,
                "vnf_version": version,
            })).collect::<Vec<_>>(),
            "connection_points": connection_points(&self.ports),
            "virtual_links": virtual_links(&self.links),
            "forwarding_graphs": forwarding_graphs,
        })
    }

    pub fn to_yaml(&self) -> String {
        to_yaml(&self.to_value())
    }
}

/// Lowercase hex MD5 of `content`
pub fn md5_hex(content: &[u8]) -> String {
    format!("{:x}", Md5::digest(content))
}

/// Builder for package fixtures. Writes a package directory whose manifest
/// records the MD5 of every listed file, and optionally zips it.
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    name: String,
    version: String,
    service: Option<ServiceBuilder>,
    functions: Vec<FunctionBuilder>,
    entry_service: Option<String>,
    unlisted_hashes: bool,
    listed_only: Vec<String>,
}

impl PackageBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: VERSION.to_string(),
            service: None,
            functions: Vec::new(),
            entry_service: None,
            unlisted_hashes: false,
            listed_only: Vec::new(),
        }
    }

    pub fn with_service(mut self, service: ServiceBuilder) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_function(mut self, function: FunctionBuilder) -> Self {
        self.functions.push(function);
        self
    }

    /// Override the manifest's `entry_service_template`
    pub fn with_entry_service(mut self, name: &str) -> Self {
        self.entry_service = Some(name.to_string());
        self
    }

    /// List a function descriptor in `package_content` without writing it
    pub fn with_listed_function(mut self, name: &str) -> Self {
        self.listed_only.push(name.to_string());
        self
    }

    /// Leave `md5` out of every `package_content` entry
    pub fn without_hashes(mut self) -> Self {
        self.unlisted_hashes = true;
        self
    }

    pub fn id(&self) -> String {
        format!("{}.{}.{}", VENDOR, self.name, self.version)
    }

    /// Package-relative path of function descriptor `name`
    pub fn function_file(name: &str) -> String {
        format!("function_descriptors/{}.yml", name)
    }

    pub const SERVICE_FILE: &'static str = "service_descriptors/nsd.yml";

    /// Write the package layout into `root` and return `root`
    pub fn write_dir(&self, root: &Path) -> PathBuf {
        let mut contents = Vec::new();

        if let Some(service) = &self.service {
            contents.push(self.write_file(
                root,
                Self::SERVICE_FILE,
                &service.to_yaml(),
                SERVICE_CONTENT_TYPE,
            ));
        }
        for function in &self.functions {
            contents.push(self.write_file(
                root,
                &Self::function_file(function.name()),
                &function.to_yaml(),
                FUNCTION_CONTENT_TYPE,
            ));
        }

        for name in &self.listed_only {
            contents.push(json!({
                "name": name,
                "content-type": FUNCTION_CONTENT_TYPE,
            }));
        }

        let entry_service = self
            .entry_service
            .clone()
            .unwrap_or_else(|| format!("/{}", Self::SERVICE_FILE));

        let manifest = json!({
            "descriptor_version": "1.0",
            "vendor": VENDOR,
            "name": self.name,
            "version": self.version,
            "maintainer": "Validator Tests",
            "entry_service_template": entry_service,
            "package_content": contents,
        });
        let manifest_path = root.join("META-INF/MANIFEST.YAML");
        fs::create_dir_all(manifest_path.parent().expect("manifest has a parent")).unwrap();
        fs::write(&manifest_path, to_yaml(&manifest)).unwrap();

        root.to_path_buf()
    }

    /// Write the package layout under `dir/src` and zip it to `dir/<name>.son`
    pub fn write_archive(&self, dir: &Path) -> PathBuf {
        let src = dir.join("src");
        self.write_dir(&src);
        let archive = dir.join(format!("{}.son", self.name));
        zip_dir(&src, &archive);
        archive
    }

    fn write_file(&self, root: &Path, relative: &str, content: &str, content_type: &str) -> Value {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("content file has a parent")).unwrap();
        fs::write(&path, content).unwrap();

        let mut entry = json!({
            "name": format!("/{}", relative),
            "content-type": content_type,
        });
        if !self.unlisted_hashes {
            entry["md5"] = json!(md5_hex(content.as_bytes()));
        }
        entry
    }
}

/// Zip every file under `src` into `archive` with package-relative names
pub fn zip_dir(src: &Path, archive: &Path) {
    let mut zip = zip::ZipWriter::new(File::create(archive).unwrap());
    for entry in WalkDir::new(src)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let relative = entry.path().strip_prefix(src).unwrap();
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(&fs::read(entry.path()).unwrap()).unwrap();
    }
    zip.finish().unwrap();
}
