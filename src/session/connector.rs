use super::*;

use crate::platform;

/// Opens SSH sessions to network devices and identifies their platform.
#[derive(Debug, Clone)]
pub struct SshConnector {
    port: u16,
    command_timeout: Duration,
    security: ConnectionSecurityOptions,
}

impl SshConnector {
    pub fn new(port: u16, command_timeout: Duration, security: ConnectionSecurityOptions) -> Self {
        Self {
            port,
            command_timeout,
            security,
        }
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new(22, Duration::from_secs(60), ConnectionSecurityOptions::default())
    }
}

#[async_trait]
impl DeviceConnector for SshConnector {
    async fn detect_device_type(
        &self,
        host: &str,
        credentials: &Credentials,
    ) -> Result<DeviceType, ConnectError> {
        let mut client = ShellClient::connect(
            host,
            self.port,
            credentials,
            platform::probe_machine()?,
            &self.security,
        )
        .await?;

        let detected = detect_platform(client.shell_mut(), self.command_timeout).await;
        if let Err(err) = client.close().await {
            debug!(
                "{} error closing detection session: {}",
                client.shell().device_addr(),
                err
            );
        }

        match detected? {
            Some(device_type) => {
                debug!("{} detected as {}", client.shell().device_addr(), device_type);
                Ok(device_type)
            }
            None => Err(ConnectError::UnsupportedDevice(host.to_string())),
        }
    }

    async fn open_session(
        &self,
        host: &str,
        credentials: &Credentials,
        device_type: DeviceType,
    ) -> Result<Box<dyn ConfigSession>, ConnectError> {
        let mut shell = ShellClient::connect(
            host,
            self.port,
            credentials,
            device_type.prompt_machine()?,
            &self.security,
        )
        .await?;

        let paging = device_type.disable_paging_command();
        let output = shell
            .shell_mut()
            .write_with_timeout(paging, self.command_timeout)
            .await?;
        if !output.success {
            debug!(
                "{} {:?} rejected: {}",
                shell.shell().device_addr(),
                paging,
                output.content
            );
        }

        Ok(Box::new(SshSession {
            shell,
            device_type,
            command_timeout: self.command_timeout,
        }))
    }
}

/// A configuration session on one device.
pub struct SshSession {
    shell: ShellClient,
    device_type: DeviceType,
    command_timeout: Duration,
}

#[async_trait]
impl ConfigSession for SshSession {
    fn device_type(&self) -> DeviceType {
        self.device_type
    }

    async fn send_config(&mut self, lines: &[String]) -> Result<String, ConnectError> {
        self.shell
            .shell_mut()
            .configure(
                self.device_type.config_mode(),
                self.device_type.exec_mode(),
                lines,
                self.command_timeout,
            )
            .await
    }

    async fn close(&mut self) -> Result<(), ConnectError> {
        self.shell.close().await
    }
}

/// Runs the detection commands in order and stops at the first one whose
/// output identifies a platform.
///
/// A command that never returns to a prompt still contributes what it printed.
async fn detect_platform(
    shell: &mut Shell,
    timeout: Duration,
) -> Result<Option<DeviceType>, ConnectError> {
    let mut outputs: HashMap<&str, String> = HashMap::new();
    for command in platform::detection_commands() {
        match shell.write_with_timeout(command, timeout).await {
            Ok(output) => {
                trace!("{} {:?} -> {:?}", shell.device_addr(), command, output.content);
                outputs.insert(command, output.content);
            }
            Err(ConnectError::ExecTimeout(partial)) => {
                debug!("{} {:?} timed out", shell.device_addr(), command);
                outputs.insert(command, partial);
            }
            Err(err) => return Err(err),
        }
        if let Some(device_type) = platform::best_match(&outputs) {
            return Ok(Some(device_type));
        }
    }
    Ok(None)
}
