use std::process::ExitCode;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use sfu_core::codec::{find_match_with_tier, CodecCapability, CodecParameters};
use sfu_core::configuration::{Command, Configuration, OutputFormat, Parser};
use sfu_core::packets::ReceptionReport;
use sfu_core::rtt::rtt_ms_at;
use sfu_core::time::NtpTime;

#[derive(Serialize)]
struct NtpOutput {
    time: String,
    ntp: String,
    raw: u64,
    seconds: u32,
    fraction: u32,
    middle: u32,
}

impl NtpOutput {
    fn new(ts: NtpTime) -> Self {
        NtpOutput {
            time: ts.to_datetime().to_rfc3339_opts(SecondsFormat::Nanos, true),
            ntp: ts.to_string(),
            raw: ts.to_wire(),
            seconds: ts.seconds(),
            fraction: ts.fraction(),
            middle: ts.middle_bits(),
        }
    }

    fn print_text(&self) {
        println!("Time: {}", self.time);
        println!("NTP: {} ({:#018x})", self.ntp, self.raw);
        println!("Seconds: {}", self.seconds);
        println!("Fraction: {:#010x}", self.fraction);
        println!("Middle 32 bits: {:#010x}", self.middle);
    }
}

#[derive(Serialize)]
struct RttOutput {
    time: String,
    now_middle: u32,
    lsr: u32,
    dlsr: u32,
    /// `None` when the report carries no LSR.
    rtt_ms: Option<u32>,
}

impl RttOutput {
    fn print_text(&self) {
        println!("Time: {}", self.time);
        println!("Now (middle 32 bits): {:#010x}", self.now_middle);
        println!("LSR: {:#010x}", self.lsr);
        println!("DLSR: {:#010x}", self.dlsr);
        match self.rtt_ms {
            Some(rtt) => println!("RTT: {} ms", rtt),
            None => println!("RTT: unknown (no sender report received)"),
        }
    }
}

#[derive(Serialize)]
struct MatchOutput<'a> {
    needle: &'a CodecCapability,
    #[serde(rename = "match")]
    found: Option<&'a CodecParameters>,
    tier: Option<String>,
}

impl MatchOutput<'_> {
    fn print_text(&self) {
        match (self.found, &self.tier) {
            (Some(c), Some(tier)) => {
                println!(
                    "Matched payload type {} ({} {:?}) by {}",
                    c.payload_type, c.capability.mime_type, c.capability.sdp_fmtp_line, tier
                );
            }
            _ => println!(
                "No match for {} {:?}",
                self.needle.mime_type, self.needle.sdp_fmtp_line
            ),
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize output: {}", e),
    }
}

fn run(conf: Configuration) -> ExitCode {
    let now = |time: Option<DateTime<Utc>>| time.unwrap_or_else(Utc::now);

    match conf.command {
        Command::Ntp { time } => {
            let out = NtpOutput::new(NtpTime::from_datetime(now(time)));
            match conf.format {
                OutputFormat::Text => out.print_text(),
                OutputFormat::Json => print_json(&out),
            }
        }
        Command::NtpDecode { value } => {
            let out = NtpOutput::new(NtpTime::from_wire(value));
            match conf.format {
                OutputFormat::Text => out.print_text(),
                OutputFormat::Json => print_json(&out),
            }
        }
        Command::Rtt { lsr, dlsr, time } => {
            let t = now(time);
            let report = ReceptionReport {
                last_sender_report: lsr,
                delay: dlsr,
                ..Default::default()
            };
            let out = RttOutput {
                time: t.to_rfc3339_opts(SecondsFormat::Nanos, true),
                now_middle: NtpTime::from_datetime(t).middle_bits(),
                lsr,
                dlsr,
                rtt_ms: (lsr != 0).then(|| rtt_ms_at(&report, t)),
            };
            match conf.format {
                OutputFormat::Text => out.print_text(),
                OutputFormat::Json => print_json(&out),
            }
        }
        Command::Match {
            mime,
            fmtp,
            candidates,
        } => {
            let needle = CodecParameters::new(CodecCapability::new(mime, 0, 0, fmtp), 0);
            let result = find_match_with_tier(&needle, &candidates);
            let out = MatchOutput {
                needle: &needle.capability,
                found: result.as_ref().ok().map(|(c, _)| *c),
                tier: result.as_ref().ok().map(|(_, tier)| tier.to_string()),
            };
            match conf.format {
                OutputFormat::Text => out.print_text(),
                OutputFormat::Json => print_json(&out),
            }
            if let Err(e) = result {
                log::info!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    env_logger::init();

    let conf = Configuration::parse();
    if let Err(e) = conf.validate() {
        log::error!("Configuration is broken: {}", e);
        eprintln!("error: {}", e);
        return ExitCode::from(2);
    }

    log::debug!("Configuration valid: {:?}", conf);

    run(conf)
}
