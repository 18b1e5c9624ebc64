//
// client.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// A minimal RDIP test client: connects over TCP, sends command lines, and
// reads back the single-line XML responses the adapter sends back. It
// understands nothing about the grammar beyond "one response per line,
// `\r\n`-terminated" -- assertions on the XML content itself are the
// test's job, not this client's.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RdipClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl RdipClient {
    pub fn connect(port: u16) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(("127.0.0.1", port))?;
        stream.set_read_timeout(Some(DEFAULT_TIMEOUT))?;
        stream.set_write_timeout(Some(DEFAULT_TIMEOUT))?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self { reader, writer: stream })
    }

    /// Sends one command line (the caller supplies no trailing newline).
    pub fn send(&mut self, command: &str) -> anyhow::Result<()> {
        write!(self.writer, "{command}\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Reads the next response line, with its `\r\n` terminator stripped.
    pub fn recv_line(&mut self) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            anyhow::bail!("RDIP connection closed while waiting for a response");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Convenience for the common "send one command, expect one response"
    /// shape most RDIP commands follow.
    pub fn roundtrip(&mut self, command: &str) -> anyhow::Result<String> {
        self.send(command)?;
        self.recv_line()
    }
}
