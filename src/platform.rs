//! Supported device platforms.
//!
//! Each [`DeviceType`] knows how to build the [`PromptMachine`] for its CLI,
//! which command turns off output paging, and which probes identify it
//! during auto-detection.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::RegexSet;

use crate::device::{Answer, PromptMachine};
use crate::error::ConnectError;

/// Network operating systems the connector can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    CiscoIos,
    CiscoNxos,
    CiscoXr,
    AristaEos,
    JuniperJunos,
    HuaweiVrp,
    HpComware,
}

/// A detection probe: run `command`, and if any pattern matches the output
/// the device scores `priority` for the probe's platform.
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub command: &'static str,
    pub patterns: &'static [&'static str],
    pub priority: u8,
}

impl DeviceType {
    /// Every supported platform, in detection order.
    pub const ALL: [DeviceType; 7] = [
        DeviceType::CiscoXr,
        DeviceType::CiscoNxos,
        DeviceType::CiscoIos,
        DeviceType::AristaEos,
        DeviceType::JuniperJunos,
        DeviceType::HuaweiVrp,
        DeviceType::HpComware,
    ];

    /// Stable snake_case identifier.
    pub fn name(self) -> &'static str {
        match self {
            DeviceType::CiscoIos => "cisco_ios",
            DeviceType::CiscoNxos => "cisco_nxos",
            DeviceType::CiscoXr => "cisco_xr",
            DeviceType::AristaEos => "arista_eos",
            DeviceType::JuniperJunos => "juniper_junos",
            DeviceType::HuaweiVrp => "huawei_vrp",
            DeviceType::HpComware => "hp_comware",
        }
    }

    /// Command that disables pagination for the rest of the session.
    pub fn disable_paging_command(self) -> &'static str {
        match self {
            DeviceType::CiscoIos
            | DeviceType::CiscoNxos
            | DeviceType::CiscoXr
            | DeviceType::AristaEos => "terminal length 0",
            DeviceType::JuniperJunos => "set cli screen-length 0",
            DeviceType::HuaweiVrp => "screen-length 0 temporary",
            DeviceType::HpComware => "screen-length disable",
        }
    }

    /// Mode in which configuration lines are accepted.
    pub fn config_mode(self) -> &'static str {
        "config"
    }

    /// Mode the session returns to after configuring.
    pub fn exec_mode(self) -> &'static str {
        "enable"
    }

    pub fn probe(self) -> Probe {
        match self {
            DeviceType::CiscoIos => Probe {
                command: "show version",
                patterns: &[
                    r"Cisco IOS Software",
                    r"Cisco Internetwork Operating System Software",
                ],
                priority: 95,
            },
            DeviceType::CiscoNxos => Probe {
                command: "show version",
                patterns: &[r"Cisco Nexus Operating System", r"NX-OS"],
                priority: 99,
            },
            DeviceType::CiscoXr => Probe {
                command: "show version",
                patterns: &[r"Cisco IOS XR"],
                priority: 99,
            },
            DeviceType::AristaEos => Probe {
                command: "show version",
                patterns: &[r"Arista"],
                priority: 99,
            },
            DeviceType::JuniperJunos => Probe {
                command: "show version",
                patterns: &[
                    r"JUNOS Software Release",
                    r"JUNOS .+ Software",
                    r"JUNOS OS Kernel",
                    r"JUNOS Base Version",
                ],
                priority: 99,
            },
            DeviceType::HuaweiVrp => Probe {
                command: "display version",
                patterns: &[
                    r"Huawei Technologies",
                    r"Huawei Versatile Routing Platform Software",
                ],
                priority: 99,
            },
            DeviceType::HpComware => Probe {
                command: "display version",
                patterns: &[r"HPE Comware", r"HP Comware", r"H3C Comware"],
                priority: 99,
            },
        }
    }

    /// Builds the prompt machine for this platform.
    pub fn prompt_machine(self) -> Result<PromptMachine, ConnectError> {
        match self {
            DeviceType::CiscoIos | DeviceType::AristaEos => cisco_like(),
            DeviceType::CiscoNxos => nxos(),
            DeviceType::CiscoXr => iosxr(),
            DeviceType::JuniperJunos => junos(),
            DeviceType::HuaweiVrp => vrp(),
            DeviceType::HpComware => comware(),
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unique probe commands in the order they should be sent.
pub fn detection_commands() -> Vec<&'static str> {
    let mut commands = Vec::new();
    for device in DeviceType::ALL {
        let command = device.probe().command;
        if !commands.contains(&command) {
            commands.push(command);
        }
    }
    commands
}

/// Every platform's detection patterns, compiled once.
static DETECTION_PATTERNS: Lazy<Vec<(DeviceType, RegexSet)>> = Lazy::new(|| {
    DeviceType::ALL
        .into_iter()
        .map(|device| match RegexSet::new(device.probe().patterns) {
            Ok(set) => (device, set),
            Err(err) => panic!("invalid detection pattern for {device}: {err}"),
        })
        .collect()
});

/// Picks the platform whose probe matches with the highest priority.
///
/// `outputs` maps each probe command to what the device printed. Ties go to
/// the platform listed first in [`DeviceType::ALL`].
pub fn best_match(outputs: &HashMap<&str, String>) -> Option<DeviceType> {
    let mut best: Option<(DeviceType, u8)> = None;
    for device in DeviceType::ALL {
        let probe = device.probe();
        let Some(output) = outputs.get(probe.command) else {
            continue;
        };
        let matched = DETECTION_PATTERNS
            .iter()
            .any(|(candidate, set)| *candidate == device && set.is_match(output));
        if matched && best.is_none_or(|(_, priority)| probe.priority > priority) {
            best = Some((device, probe.priority));
        }
    }
    best.map(|(device, _)| device)
}

/// Prompt machine used before the platform is known. It recognises the
/// common prompt shapes of every supported platform as a single mode.
pub fn probe_machine() -> Result<PromptMachine, ConnectError> {
    PromptMachine::builder()
        .prompt(
            "Enable",
            [
                r"^\S+@\S+[>#%]\s*$",
                r"^<[^>\s]+>\s*$",
                r"^(HRP_M|HRP_S)?\[[^\]\s]+\]\s*$",
                r"^[^\s#>]+[#>]\s*$",
            ],
        )
        .more([
            r"\s*--More--\s*",
            r"\s*---- More ----\s*",
            r"---\(more.*\)---",
        ])
        .build()
}

fn cisco_like() -> Result<PromptMachine, ConnectError> {
    PromptMachine::builder()
        .prompt("Config", [r"^\S+\(\S+\)#\s*$"])
        .prompt("Enable", [r"^[^\s#]+#\s*$"])
        .prompt("Login", [r"^[^\s<]+>\s*$"])
        .input(
            "EnablePassword",
            Answer::Param("EnablePassword".to_string()),
            true,
            [r"^\x00*\r?(Enable )?Password:"],
        )
        .more([r"\s*--More--\s*", r"\s*<--- More --->\s*"])
        .errors([
            r"% Invalid input detected at '\^' marker\.",
            r"% Invalid command at '\^' marker\.",
            r"% Invalid parameter detected at '\^' marker\.",
            r"% Incomplete command\.",
            r"% Ambiguous command:.*",
            r"^%.+",
            r"^Command authorization failed.*",
            r"^Command rejected:.*",
            r"ERROR:.+",
        ])
        .transition("Login", "enable", "Enable")
        .transition("Enable", "configure terminal", "Config")
        .transition("Config", "end", "Enable")
        .transition("Enable", "disable", "Login")
        .build()
}

fn nxos() -> Result<PromptMachine, ConnectError> {
    PromptMachine::builder()
        .prompt("Config", [r"^\S+\(config\S*\)#\s*$"])
        .prompt("Enable", [r"^[^\s#]+#\s*$"])
        .more([r"\s*--More--\s*"])
        .errors([
            r"% Invalid command at '\^' marker\.",
            r"% Invalid parameter detected at '\^' marker\.",
            r"% Incomplete command.*",
            r"^%.+",
            r"^Syntax error while parsing.*",
        ])
        .transition("Enable", "configure terminal", "Config")
        .transition("Config", "end", "Enable")
        .build()
}

fn iosxr() -> Result<PromptMachine, ConnectError> {
    PromptMachine::builder()
        .prompt("Config", [r"^\S+\(config\S*\)#\s*$"])
        .prompt("Enable", [r"^[^\s#]+#\s*$"])
        // Leaving config with uncommitted changes; the operator commits explicitly.
        .input(
            "UncommittedChanges",
            Answer::Text("no\n".to_string()),
            true,
            [r"Uncommitted changes found, commit them before exiting.*"],
        )
        .more([r"\s*--More--\s*"])
        .errors([
            r"% Invalid input detected at '\^' marker\.",
            r"% Incomplete command\.",
            r"% Failed to commit.*",
            r"^%.+",
        ])
        .transition("Enable", "configure terminal", "Config")
        .transition("Config", "end", "Enable")
        .build()
}

fn junos() -> Result<PromptMachine, ConnectError> {
    PromptMachine::builder()
        .prompt("Config", [r"^\S+@\S+#\s*$"])
        .prompt("Enable", [r"^\S+@\S+>\s*$"])
        .input(
            "UncommittedChanges",
            Answer::Text("yes\n".to_string()),
            true,
            [r"Exit with uncommitted changes\? \[yes,no\] \(yes\) "],
        )
        .more([r"---\(more.*\)---"])
        .errors([
            r".*unknown command.*",
            r"syntax error.*",
            r"error:.+",
            r"invalid value .+",
            r"invalid ip address .+",
            r"\s+\^$",
        ])
        .ignore_errors([
            r"warning: statement not found",
            r"warning: element \S+ not found",
        ])
        .transition("Enable", "configure", "Config")
        .transition("Config", "exit configuration-mode", "Enable")
        .build()
}

fn vrp() -> Result<PromptMachine, ConnectError> {
    PromptMachine::builder()
        .prompt("Config", [r"^(HRP_M|HRP_S){0,1}\[.+]+\s*$"])
        .prompt("Enable", [r"^(RBM_P|RBM_S)?<.+>\s*$"])
        .input(
            "Confirm",
            Answer::Text("y\n".to_string()),
            true,
            [
                r"Are you sure to continue\?\[Y\/N\]: ",
                r"Warning: The current configuration will be written to the device. Continue\? \[Y\/N\]: ",
            ],
        )
        .more([r"\s*---- More ----\s*"])
        .errors([r"Error: .+$", r"\^$"])
        .ignore_errors([
            r"Error: The delete configuration does not exist.",
            r"This condition has already been configured",
        ])
        .transition("Enable", "system-view", "Config")
        .transition("Config", "return", "Enable")
        .build()
}

fn comware() -> Result<PromptMachine, ConnectError> {
    PromptMachine::builder()
        .prompt("Config", [r"^(RBM_P|RBM_S)?\[.+\]\s*$"])
        .prompt("Enable", [r"^(RBM_P|RBM_S)?<.+>\s*$"])
        .more([r"\s*---- More ----\s*"])
        .errors([
            r".+\^.+",
            r"% Unrecognized command found at '\^' position\.",
            r"% Incomplete command found at '\^' position\.",
            r".+doesn't exist.+",
            r".+does not exist.+",
        ])
        .transition("Enable", "system-view", "Config")
        .transition("Config", "return", "Enable")
        .build()
}
