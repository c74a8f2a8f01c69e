//! Scripted in-memory port for protocol tests.
//!
//! Each element of the read script is returned by one `read` call, which
//! matches how the device answers: one response per command. An exhausted
//! script behaves like a read timeout (zero bytes).

use {
    crate::{
        error::Result,
        port::{Port, SerialConfig},
    },
    std::{
        collections::VecDeque,
        io::{Read, Write},
    },
};

pub(crate) struct ScriptedPort {
    reads: VecDeque<Vec<u8>>,
    /// Everything written to the port, frames and payload alike.
    pub written: Vec<u8>,
    /// Cap on bytes accepted per write call, to simulate partial writes.
    pub write_limit: Option<usize>,
    /// Write call index (0-based) at which writes start failing.
    pub fail_write_at: Option<usize>,
    write_calls: usize,
    open: bool,
    pub closes: usize,
    pub reopens: usize,
    config: SerialConfig,
    pub configs_applied: Vec<SerialConfig>,
}

impl ScriptedPort {
    pub(crate) fn new<I>(reads: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self {
            reads: reads.into_iter().collect(),
            written: Vec::new(),
            write_limit: None,
            fail_write_at: None,
            write_calls: 0,
            open: true,
            closes: 0,
            reopens: 0,
            config: SerialConfig::new("mock", 9600),
            configs_applied: Vec::new(),
        }
    }
}

impl Read for ScriptedPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if !self.open {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "port closed",
            ));
        }
        match self.reads.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                Ok(n)
            },
            // Script exhausted: behave like a read timeout.
            None => Ok(0),
        }
    }
}

impl Write for ScriptedPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if !self.open {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "port closed",
            ));
        }
        let call = self.write_calls;
        self.write_calls += 1;
        if self.fail_write_at.is_some_and(|at| call >= at) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "scripted write failure",
            ));
        }
        let n = match self.write_limit {
            Some(limit) => buf.len().min(limit),
            None => buf.len(),
        };
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Port for ScriptedPort {
    fn name(&self) -> &str {
        &self.config.port_name
    }

    fn config(&self) -> SerialConfig {
        self.config.clone()
    }

    fn apply_config(&mut self, config: &SerialConfig) -> Result<()> {
        self.configs_applied.push(config.clone());
        self.config.baud_rate = config.baud_rate;
        self.config.timeout = config.timeout;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            self.closes += 1;
        }
        Ok(())
    }

    fn reopen(&mut self) -> Result<()> {
        self.open = true;
        self.reopens += 1;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
