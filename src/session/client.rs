use super::*;

/// How long to wait for the first prompt after the shell opens.
const LOGIN_TIMEOUT: Duration = Duration::from_secs(60);

impl ShellClient {
    /// Connects, opens a PTY shell and waits until the device shows a prompt.
    pub async fn connect(
        addr: &str,
        port: u16,
        credentials: &Credentials,
        machine: PromptMachine,
        security_options: &ConnectionSecurityOptions,
    ) -> Result<ShellClient, ConnectError> {
        if addr.trim().is_empty() {
            return Err(ConnectError::InvalidHost("empty hostname".to_string()));
        }
        let device_addr = format!("{}@{addr}:{port}", credentials.username);

        let config = Config {
            preferred: security_options.preferred(),
            inactivity_timeout: Some(Duration::from_secs(60)),
            ..Default::default()
        };

        let client = Client::connect_with_config(
            (addr, port),
            &credentials.username,
            AuthMethod::with_password(&credentials.password),
            security_options.server_check.clone(),
            config,
        )
        .await?;
        debug!("{} TCP connection successful", device_addr);

        let mut channel = client.get_channel().await?;
        channel
            .request_pty(false, "xterm", 800, 600, 0, 0, &[])
            .await?;
        channel.request_shell(false).await?;
        debug!("{} Shell request successful", device_addr);

        let (sender_to_shell, mut receiver_from_user) = mpsc::channel::<String>(256);
        let (sender_to_user, receiver_from_shell) = mpsc::channel::<String>(256);

        let io_task_device_addr = device_addr.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(data) = receiver_from_user.recv() => {
                        if let Err(e) = channel.data(data.as_bytes()).await {
                            debug!("{} Failed to send data to shell: {:?}", io_task_device_addr, e);
                            break;
                        }
                    },
                    Some(msg) = channel.wait() => {
                        match msg {
                            ChannelMsg::Data { ref data } => {
                                let text = String::from_utf8_lossy(data).into_owned();
                                if sender_to_user.send(text).await.is_err() {
                                    debug!("{} Shell output receiver dropped. Closing task.", io_task_device_addr);
                                    break;
                                }
                            }
                            ChannelMsg::ExitStatus { exit_status } => {
                                debug!("{} Shell exited with status code: {}", io_task_device_addr, exit_status);
                                let _ = channel.eof().await;
                                break;
                            }
                            ChannelMsg::Eof => {
                                debug!("{} Shell sent EOF.", io_task_device_addr);
                                break;
                            }
                            _ => {}
                        }
                    }
                    else => break,
                }
            }
            debug!("{} SSH I/O task ended.", io_task_device_addr);
        });

        let mut shell = Shell::new(sender_to_shell, receiver_from_shell, machine, device_addr);
        shell.login(credentials, LOGIN_TIMEOUT).await?;

        Ok(Self { client, shell })
    }

    /// Checks if the underlying SSH connection is still active.
    pub fn is_connected(&self) -> bool {
        !self.client.is_closed()
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut Shell {
        &mut self.shell
    }

    /// Leaves the shell and drops the connection.
    pub async fn close(&mut self) -> Result<(), ConnectError> {
        debug!("{} Closing SSH connection", self.shell.device_addr());

        if self.is_connected() {
            self.shell.send_exit().await;
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.client.disconnect().await?;
        }

        debug!("{} SSH connection closed", self.shell.device_addr());
        Ok(())
    }
}
