// SPDX-License-Identifier: GPL-3.0-only

//! Torch control and the observable torch state
//!
//! The countdown drives the torch through a [`TorchDriver`] and mirrors every
//! change into [`FlashState`], which the presentation layer watches to render
//! a live indicator.
//!
//! On Linux the torch is a flash LED exposed at `/sys/class/leds/*:flash`.
//! Torch mode uses the `brightness` file, which is group-writable by
//! `feedbackd`, avoiding the root-only `flash_strobe` interface.

use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default sysfs LED class directory
pub const SYSFS_LEDS_DIR: &str = "/sys/class/leds";

/// Boolean torch control
///
/// Failures are the driver's to log; the countdown keeps its schedule even if
/// one toggle does not reach the hardware.
pub trait TorchDriver: Send + Sync {
    /// Switch the torch on or off
    fn set_torch(&self, on: bool);
}

/// Driver for cameras without a controllable flash
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTorch;

impl TorchDriver for NoTorch {
    fn set_torch(&self, on: bool) {
        debug!(on, "No torch available, ignoring");
    }
}

/// Observable torch state shared with the presentation layer
///
/// Cloning yields another handle to the same state.
#[derive(Debug, Clone)]
pub struct FlashState {
    tx: watch::Sender<bool>,
}

impl FlashState {
    /// Create a state with the torch off
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Current torch state
    pub fn torch_on(&self) -> bool {
        *self.tx.borrow()
    }

    /// Record a new torch state, notifying watchers only on change
    pub fn set(&self, on: bool) {
        self.tx.send_if_modified(|current| {
            let changed = *current != on;
            *current = on;
            changed
        });
    }

    /// Subscribe to torch state changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for FlashState {
    fn default() -> Self {
        Self::new()
    }
}

/// A flash LED device discovered via sysfs
#[derive(Debug, Clone)]
pub struct FlashDevice {
    /// Sysfs path, e.g. `/sys/class/leds/white:flash`
    path: PathBuf,
    /// Maximum brightness value (from `max_brightness` file)
    max_brightness: u32,
    /// Human-readable name (directory basename)
    name: String,
}

impl FlashDevice {
    /// Get the device name (e.g. "white:flash")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum raw brightness
    pub fn max_brightness(&self) -> u32 {
        self.max_brightness
    }

    /// Set raw brightness value (0 = off, max_brightness = full)
    pub fn set_brightness(&self, value: u32) -> io::Result<()> {
        let clamped = value.min(self.max_brightness);
        std::fs::write(self.path.join("brightness"), clamped.to_string())
    }

    /// Turn off the LED
    pub fn off(&self) -> io::Result<()> {
        self.set_brightness(0)
    }

    /// Turn on at full brightness
    pub fn on(&self) -> io::Result<()> {
        self.set_brightness(self.max_brightness)
    }
}

/// Result of hardware flash detection.
///
/// Separates "hardware exists" from "we can control it" so the CLI can show
/// a helpful permission error instead of silently running without a torch.
#[derive(Debug)]
pub struct FlashHardware {
    /// Devices we can actually control (writable)
    pub devices: Vec<FlashDevice>,
    /// User-facing error if hardware was found but not writable
    pub permission_error: Option<String>,
}

impl FlashHardware {
    /// Scan `/sys/class/leds/` for `*:flash` entries.
    pub fn detect() -> FlashHardware {
        Self::detect_in(Path::new(SYSFS_LEDS_DIR))
    }

    /// Scan an LED class directory for `*:flash` entries.
    ///
    /// Always detects hardware presence. If LEDs exist but the brightness
    /// file is not writable, builds a user-friendly error message with
    /// the correct privilege escalation command and group name.
    pub fn detect_in(leds_dir: &Path) -> FlashHardware {
        let Ok(entries) = std::fs::read_dir(leds_dir) else {
            warn!(path = %leds_dir.display(), "Cannot read LED directory, flash discovery skipped");
            return FlashHardware {
                devices: Vec::new(),
                permission_error: None,
            };
        };

        let mut devices = Vec::new();
        let mut permission_failures: Vec<(String, PathBuf)> = Vec::new();

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name_str) = name.to_str() else {
                continue;
            };

            // Match entries like "white:flash", "yellow:flash"
            if !name_str.ends_with(":flash") {
                continue;
            }

            let led_path = entry.path();
            let brightness_path = led_path.join("brightness");
            let max_brightness_path = led_path.join("max_brightness");

            let max_brightness = match std::fs::read_to_string(&max_brightness_path) {
                Ok(s) => match s.trim().parse::<u32>() {
                    Ok(v) if v > 0 => v,
                    _ => {
                        warn!(
                            path = %max_brightness_path.display(),
                            "Invalid max_brightness value"
                        );
                        continue;
                    }
                },
                Err(e) => {
                    warn!(
                        path = %max_brightness_path.display(),
                        error = %e,
                        "Cannot read max_brightness"
                    );
                    continue;
                }
            };

            // Attempt write access
            match std::fs::OpenOptions::new()
                .write(true)
                .open(&brightness_path)
            {
                Ok(_) => {
                    info!(name = name_str, max_brightness, "Discovered flash LED");
                    devices.push(FlashDevice {
                        path: led_path,
                        max_brightness,
                        name: name_str.to_string(),
                    });
                }
                Err(_) => {
                    warn!(
                        path = %brightness_path.display(),
                        "Flash LED found but not writable"
                    );
                    permission_failures.push((name_str.to_string(), brightness_path));
                }
            }
        }

        // Deterministic ordering (white before yellow)
        devices.sort_by(|a, b| a.name.cmp(&b.name));

        let permission_error = if !permission_failures.is_empty() && devices.is_empty() {
            Some(Self::build_permission_error(&permission_failures))
        } else {
            None
        };

        FlashHardware {
            devices,
            permission_error,
        }
    }

    /// Whether any controllable flash devices were found
    pub fn has_devices(&self) -> bool {
        !self.devices.is_empty()
    }

    /// Build a user-friendly permission error message.
    ///
    /// Detects the current username, the required group from file
    /// ownership, and whether `doas` or `sudo` is available.
    fn build_permission_error(failures: &[(String, PathBuf)]) -> String {
        let username = std::env::var("USER").unwrap_or_else(|_| "user".to_string());

        let escalation_tool = if Path::new("/usr/bin/doas").exists() {
            "doas"
        } else {
            "sudo"
        };

        let group = failures
            .first()
            .and_then(|(_, path)| {
                let gid = std::fs::metadata(path).ok()?.gid();
                // Resolve GID to group name by reading /etc/group
                let group_contents = std::fs::read_to_string("/etc/group").ok()?;
                group_contents.lines().find_map(|line| {
                    let parts: Vec<&str> = line.split(':').collect();
                    (parts.len() >= 3 && parts[2].parse::<u32>().ok() == Some(gid))
                        .then(|| parts[0].to_string())
                })
            })
            .unwrap_or_else(|| "feedbackd".to_string());

        format!(
            "Flash LEDs detected but cannot be controlled.\n\n\
             Run: {escalation_tool} adduser {username} {group}\n\n\
             Then log out and back in."
        )
    }
}

/// Torch backed by every controllable sysfs flash LED
#[derive(Debug, Clone)]
pub struct SysfsTorch {
    devices: Vec<FlashDevice>,
}

impl SysfsTorch {
    pub fn new(devices: Vec<FlashDevice>) -> Self {
        Self { devices }
    }

    /// Detect LEDs; `None` if nothing is controllable
    pub fn detect() -> Option<Self> {
        let hardware = FlashHardware::detect();
        if let Some(error) = &hardware.permission_error {
            warn!("{}", error);
        }
        hardware
            .has_devices()
            .then(|| Self::new(hardware.devices))
    }
}

impl TorchDriver for SysfsTorch {
    fn set_torch(&self, on: bool) {
        for dev in &self.devices {
            let result = if on { dev.on() } else { dev.off() };
            if let Err(e) = result {
                warn!(device = %dev.name, on, error = %e, "Failed to set flash LED");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_led(root: &Path, name: &str, max_brightness: &str) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("max_brightness"), max_brightness).unwrap();
        std::fs::write(dir.join("brightness"), "0").unwrap();
        dir
    }

    #[test]
    fn test_detect_filters_and_sorts_flash_leds() {
        let root = tempfile::tempdir().unwrap();
        fake_led(root.path(), "yellow:flash", "255\n");
        fake_led(root.path(), "white:flash", "100\n");
        fake_led(root.path(), "input3::capslock", "1\n");
        fake_led(root.path(), "red:flash", "0\n");

        let hardware = FlashHardware::detect_in(root.path());
        let names: Vec<&str> = hardware.devices.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["white:flash", "yellow:flash"]);
        assert!(hardware.permission_error.is_none());
    }

    #[test]
    fn test_detect_missing_directory() {
        let hardware = FlashHardware::detect_in(Path::new("/nonexistent/leds"));
        assert!(!hardware.has_devices());
        assert!(hardware.permission_error.is_none());
    }

    #[test]
    fn test_sysfs_torch_writes_brightness() {
        let root = tempfile::tempdir().unwrap();
        let led = fake_led(root.path(), "white:flash", "150");

        let torch = SysfsTorch::new(FlashHardware::detect_in(root.path()).devices);
        torch.set_torch(true);
        assert_eq!(std::fs::read_to_string(led.join("brightness")).unwrap(), "150");
        torch.set_torch(false);
        assert_eq!(std::fs::read_to_string(led.join("brightness")).unwrap(), "0");
    }

    #[test]
    fn test_flash_state_notifies_on_change_only() {
        let state = FlashState::new();
        let mut rx = state.subscribe();
        assert!(!state.torch_on());

        state.set(false);
        assert!(!rx.has_changed().unwrap());

        state.set(true);
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
        assert!(state.torch_on());
    }
}
