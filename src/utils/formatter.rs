use anyhow::Result;
use colored::*;

use crate::http::Response;

pub enum ResponseFormat {
    Compact,
    Verbose,
}

/// 响应的终端展示（inspect 使用）
pub struct ResponseFormatter {
    format: ResponseFormat,
    color: bool,
}

impl ResponseFormatter {
    /// compact 模式下 body 超过该长度只显示字节数
    const COMPACT_BODY_LIMIT: usize = 200;

    pub fn new(format: ResponseFormat) -> Self {
        Self {
            format,
            color: true,
        }
    }

    pub fn without_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn format(&self, response: &Response) -> Result<String> {
        let mut output = vec![self.status_line(response), self.timing(response)];

        match self.format {
            ResponseFormat::Compact => {
                let body = &response.body;
                if !body.is_empty() && body.len() < Self::COMPACT_BODY_LIMIT {
                    output.push(self.body_text(response)?);
                } else if !body.is_empty() {
                    output.push(format!("Body: {} bytes", body.len()));
                }
            }
            ResponseFormat::Verbose => {
                output.push(String::new());
                output.push(self.heading("Headers:"));
                for (key, value) in response.headers.iter() {
                    let value_str = value.to_str().unwrap_or("<invalid utf-8>");
                    let line = format!("   {}: {}", key, value_str);
                    output.push(if self.color {
                        line.blue().to_string()
                    } else {
                        line
                    });
                }

                if !response.body.is_empty() {
                    output.push(String::new());
                    output.push(self.heading("Body:"));
                    output.push(self.body_text(response)?);
                }
            }
        }

        Ok(output.join("\n"))
    }

    fn status_line(&self, response: &Response) -> String {
        let status_line = format!("HTTP {}", response.status);
        if !self.color {
            return status_line;
        }

        let colored = if response.is_success() {
            status_line.green()
        } else if response.is_client_error() {
            status_line.yellow()
        } else {
            status_line.red()
        };
        match self.format {
            ResponseFormat::Compact => colored.to_string(),
            ResponseFormat::Verbose => colored.bold().to_string(),
        }
    }

    fn timing(&self, response: &Response) -> String {
        let timing = format!("Time: {}ms", response.duration.as_millis());
        if self.color {
            timing.cyan().to_string()
        } else {
            timing
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.blue().bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// JSON body 美化输出，其余原样
    fn body_text(&self, response: &Response) -> Result<String> {
        match &response.json {
            Some(json) => Ok(serde_json::to_string_pretty(json)?),
            None => Ok(response.body.clone()),
        }
    }
}
