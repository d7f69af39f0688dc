use crate::hardware::ProbeBus;
use crate::models::{BusHandle, Reading};
use indexmap::IndexMap;
use log::{debug, error};
use std::fs::{read_dir, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// DS18B20 family code on the 1-Wire bus.
const DS18B20_FAMILY: &str = "28-";
const CELSIUS_TO_KELVIN: f32 = 273.15;

/// Temperature probes read through the Linux 1-Wire sysfs tree.
///
/// Each probe lives at `{root}/{address}/`. Newer kernels expose a
/// `temperature` file in millidegrees Celsius; older ones only the
/// `w1_slave` dump, which ends in `t=<millidegrees>` after a CRC line.
///
/// Sensor ids are mapped to device addresses through the probe-selection
/// table. Ids without an entry are used as the address directly. Lookup is
/// case-insensitive since INI keys may be folded to lowercase on load.
///
/// Readings are reported in Kelvin.
#[derive(Debug)]
pub struct W1Bus {
    root: PathBuf,
    assignments: IndexMap<String, String>,
    started: Instant,
}

impl W1Bus {
    pub fn new<P: AsRef<Path>>(root: P, assignments: &IndexMap<String, String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            assignments: assignments
                .iter()
                .map(|(id, address)| (id.to_lowercase(), address.clone()))
                .collect(),
            started: Instant::now(),
        }
    }

    /// Device address for a sensor id.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.assignments
            .get(&id.to_lowercase())
            .map(String::as_str)
            .unwrap_or(id)
    }

    /// Addresses of all DS18B20 probes currently present on the bus.
    pub fn discover(&self) -> Vec<String> {
        let Ok(dir) = read_dir(&self.root) else {
            error!("Unable to list 1-Wire devices in {}", self.root.display());
            return Vec::new();
        };
        let mut addresses: Vec<String> = dir
            .flatten()
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| name.starts_with(DS18B20_FAMILY))
            .collect();
        addresses.sort();
        addresses
    }

    fn read_millidegrees(&self, address: &str) -> Option<i32> {
        let device = self.root.join(address);
        read_number_from_file(&device.join("temperature"))
            .or_else(|| parse_w1_slave(&get_file_line(&device.join("w1_slave"), 80)?))
    }
}

impl ProbeBus for W1Bus {
    fn read_probe(&mut self, bus: BusHandle, address: &str) -> Option<Reading> {
        let start = Instant::now();
        let device = self.resolve(address).to_string();
        let result = self
            .read_millidegrees(&device)
            .map(convert_millidegrees_kelvin)
            .map(|kelvin| Reading::new(kelvin, self.started.elapsed().as_millis() as u64));
        if result.is_none() {
            error!("{}: no reading from probe {} ({})", bus, address, device);
        }
        debug!("read_probe {} took: {} ms", device, start.elapsed().as_millis());
        result
    }
}

// Read arbitrary string data.
fn get_file_line(file: &Path, capacity: usize) -> Option<String> {
    let mut reader = String::with_capacity(capacity);
    let mut f = File::open(file).ok()?;
    f.read_to_string(&mut reader).ok()?;
    reader.truncate(reader.trim_end().len());
    Some(reader)
}

/// Reads a single integer from a sysfs attribute file.
fn read_number_from_file<N>(file: &Path) -> Option<N>
where
    N: std::str::FromStr,
{
    let mut reader = [0u8; 32];
    let mut f = File::open(file).ok()?;
    let n = f.read(&mut reader).ok()?;
    // parse and trim would complain about `\0`.
    let number = std::str::from_utf8(&reader[..n]).ok()?;
    number.trim_matches(|c: char| c.is_whitespace() || c == '\0').parse().ok()
}

/// Extracts the temperature from a `w1_slave` dump, rejecting bad CRCs.
fn parse_w1_slave(contents: &str) -> Option<i32> {
    let mut lines = contents.lines();
    if !lines.next()?.trim_end().ends_with("YES") {
        return None;
    }
    let (_, value) = lines.next()?.rsplit_once("t=")?;
    value.trim().parse().ok()
}

#[inline]
fn convert_millidegrees_kelvin(millidegrees: i32) -> f32 {
    millidegrees as f32 / 1000.0 + CELSIUS_TO_KELVIN
}
