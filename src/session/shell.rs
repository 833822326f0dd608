use super::*;

impl Shell {
    pub fn new(
        sender: Sender<String>,
        recv: Receiver<String>,
        machine: PromptMachine,
        device_addr: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            recv,
            machine,
            device_addr: device_addr.into(),
        }
    }

    /// Reads until the device shows its first prompt.
    ///
    /// Questions asked on the way (enable secret, banner confirmations) are
    /// answered through the prompt machine. The enable secret is assumed to
    /// match the login password.
    pub async fn login(
        &mut self,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<(), ConnectError> {
        self.machine
            .set_param("EnablePassword", format!("{}\n", credentials.password));

        let machine = &mut self.machine;
        let recv = &mut self.recv;
        let sender = &self.sender;
        let mut buffer = String::new();
        let mut initial_output = String::new();

        let login = tokio::time::timeout(timeout, async {
            loop {
                let Some(data) = recv.recv().await else {
                    return Err(ConnectError::ChannelDisconnect);
                };
                trace!("{:?}", data);
                buffer.push_str(&data);
                initial_output.push_str(&data);

                while let Some(newline_pos) = buffer.find('\n') {
                    let line = buffer.drain(..=newline_pos).collect::<String>();
                    machine.read(line.trim_end());
                }

                if !buffer.is_empty() {
                    if machine.is_prompt(&buffer) {
                        machine.read(&buffer);
                        return Ok(());
                    }
                    if let Some((answer, _)) = machine.answer_for(&buffer) {
                        machine.read(&buffer);
                        buffer.clear();
                        sender.send(answer).await?;
                    }
                }
            }
        })
        .await;

        match login {
            Ok(Ok(())) => {
                debug!("{} Logged in at prompt {:?}", self.device_addr, self.prompt());
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(ConnectError::Timeout(if initial_output.is_empty() {
                "waiting for initial prompt".to_string()
            } else {
                initial_output
            })),
        }
    }

    pub fn device_addr(&self) -> &str {
        &self.device_addr
    }

    /// Last prompt the device printed.
    pub fn prompt(&self) -> &str {
        self.machine.current_prompt().unwrap_or_default()
    }

    /// Current mode as tracked by the prompt machine.
    pub fn current_mode(&self) -> &str {
        self.machine.current_state()
    }

    /// Executes a command and waits until the device prints a prompt again.
    ///
    /// On timeout the error carries everything received so far, including a
    /// trailing partial line.
    pub async fn write_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<Output, ConnectError> {
        let machine = &mut self.machine;
        let recv = &mut self.recv;
        let sender = &self.sender;

        // Drop anything left over from the previous command.
        while recv.try_recv().is_ok() {}

        sender.send(format!("{command}\n")).await?;

        let mut clean_output = String::new();
        let mut line_buffer = String::new();

        let result = tokio::time::timeout(timeout, async {
            let mut is_error = false;
            loop {
                let Some(data) = recv.recv().await else {
                    return Err(ConnectError::ChannelDisconnect);
                };
                line_buffer.push_str(&data);

                while let Some(newline_pos) = line_buffer.find('\n') {
                    let line = line_buffer.drain(..=newline_pos).collect::<String>();
                    let line = IGNORE_START_LINE.replace(&line, "");
                    machine.read(line.trim_end());
                    if machine.error() {
                        is_error = true;
                    }
                    clean_output.push_str(&line);
                }

                // What is left without a newline is usually the prompt.
                if !line_buffer.is_empty() {
                    if machine.is_prompt(&line_buffer) {
                        machine.read(&line_buffer);
                        clean_output.push_str(&line_buffer);
                        line_buffer.clear();
                        return Ok(!is_error);
                    }
                    if let Some((answer, record)) = machine.answer_for(&line_buffer) {
                        machine.read(&line_buffer);
                        if record {
                            clean_output.push_str(&line_buffer);
                        }
                        line_buffer.clear();
                        trace!("Input required: '{:?}'", answer);
                        sender.send(answer).await?;
                    }
                }
            }
        })
        .await;

        let success = match result {
            Err(_) => {
                clean_output.push_str(&line_buffer);
                return Err(ConnectError::ExecTimeout(clean_output));
            }
            Ok(Err(err)) => return Err(err),
            Ok(Ok(success)) => success,
        };

        let mut content = clean_output.as_str();
        // Remove the echoed command.
        if !command.is_empty() && content.starts_with(command) {
            content = content
                .strip_prefix(command)
                .unwrap_or(content)
                .trim_start_matches(['\n', '\r']);
        }
        // Remove the trailing prompt.
        let content = match content.rfind('\n') {
            Some(pos) => &content[..pos],
            None => "",
        };

        Ok(Output {
            success,
            content: content.trim_end_matches('\r').to_string(),
            all: clean_output.clone(),
        })
    }

    /// Moves the device into `mode`, replaying transition commands as needed.
    ///
    /// Returns the combined output of the transition commands. `success` is
    /// false if a transition lands somewhere other than planned.
    pub async fn enter_mode(&mut self, mode: &str, timeout: Duration) -> Result<Output, ConnectError> {
        let path = self.machine.path_to(mode)?;
        let mut all = String::new();
        let mut success = true;

        for (command, target) in path {
            debug!("{} Trans state command: {}", self.device_addr, command);
            let output = self.write_with_timeout(&command, timeout).await?;
            all.push_str(&output.all);
            if !output.success || self.machine.current_state() != target {
                success = false;
                break;
            }
        }

        Ok(Output {
            success,
            content: String::new(),
            all,
        })
    }

    /// Enters `config_mode`, sends every line in order, returns to
    /// `exec_mode` and yields the whole transcript starting at the current
    /// prompt.
    ///
    /// Lines the device rejects are logged and sending continues.
    pub async fn configure(
        &mut self,
        config_mode: &str,
        exec_mode: &str,
        lines: &[String],
        timeout: Duration,
    ) -> Result<String, ConnectError> {
        for mode in [config_mode, exec_mode] {
            if !self.machine.has_mode(mode) {
                return Err(ConnectError::InvalidPromptMachine(format!(
                    "no {mode} mode for {}",
                    self.device_addr
                )));
            }
        }
        let mut transcript = self.prompt().to_string();

        let entered = self.enter_mode(config_mode, timeout).await?;
        transcript.push_str(&entered.all);
        if !entered.success {
            return Err(ConnectError::UnreachableState(format!(
                "{config_mode} (device stayed in {})",
                self.current_mode()
            )));
        }

        for line in lines {
            let output = self.write_with_timeout(line, timeout).await?;
            if !output.success {
                debug!(
                    "{} rejected {:?}: {}",
                    self.device_addr, line, output.content
                );
            }
            transcript.push_str(&output.all);
        }

        let exited = self.enter_mode(exec_mode, timeout).await?;
        transcript.push_str(&exited.all);

        Ok(transcript)
    }

    /// Asks the device to end the session. Output is no longer read.
    pub(super) async fn send_exit(&mut self) {
        self.recv.close();
        if let Err(e) = self.sender.send("exit\n".to_string()).await {
            debug!("Failed to send exit command: {:?}", e);
        }
    }
}
