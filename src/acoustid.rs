//! Acoustic fingerprint lookup via Chromaprint and the AcoustID web service.
//!
//! The fingerprint is computed by the `fpcalc` executable that ships with
//! Chromaprint.  It is then sent to AcoustID, which answers with scored
//! MusicBrainz recordings.  Every recording becomes one [`ScoredMatch`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::candidates::ScoredMatch;
use crate::rate_limiter::RateLimiter;

pub const LOOKUP_URL: &str = "https://api.acoustid.org/v2/lookup";
const USER_AGENT: &str = concat!("aidmatch/", env!("CARGO_PKG_VERSION"));

/// Default name of the Chromaprint command-line tool.
pub const DEFAULT_FPCALC: &str = "fpcalc";

/// AcoustID allows three requests per second.
const RATE_LIMIT_MILLIS: u64 = 334;

#[derive(Debug, Error)]
pub enum AcoustIdError {
    #[error("chromaprint library/tool not found ({program})")]
    NoBackend { program: String },

    #[error("fingerprint could not be calculated ({path}): {reason}")]
    FingerprintGeneration { path: String, reason: String },

    #[error("web service request failed: {0}")]
    WebService(String),
}

// ── fpcalc ───────────────────────────────────────────────────────────────────

/// A Chromaprint fingerprint and the duration of the audio it covers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Fingerprint {
    /// Duration in seconds
    pub duration: f64,
    pub fingerprint: String,
}

/// Parse the output of `fpcalc -json`.
pub fn parse_fpcalc_output(output: &str) -> Result<Fingerprint, String> {
    let fp: Fingerprint =
        serde_json::from_str(output).map_err(|e| format!("unexpected fpcalc output: {}", e))?;
    if fp.fingerprint.is_empty() {
        return Err("fpcalc returned an empty fingerprint".to_string());
    }
    Ok(fp)
}

/// Run `fpcalc` on a file.
pub fn fingerprint_file(fpcalc: &Path, path: &Path) -> Result<Fingerprint, AcoustIdError> {
    let output = Command::new(fpcalc).arg("-json").arg(path).output();

    let output = match output {
        Ok(o) => o,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AcoustIdError::NoBackend {
                program: fpcalc.display().to_string(),
            });
        }
        Err(e) => {
            return Err(AcoustIdError::FingerprintGeneration {
                path: path.display().to_string(),
                reason: e.to_string(),
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AcoustIdError::FingerprintGeneration {
            path: path.display().to_string(),
            reason: stderr.trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_fpcalc_output(&stdout).map_err(|reason| AcoustIdError::FingerprintGeneration {
        path: path.display().to_string(),
        reason,
    })
}

// ── Lookup response ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LookupResponse {
    status: String,
    #[serde(default)]
    error: Option<ServiceError>,
    #[serde(default)]
    results: Option<Vec<LookupResult>>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    score: f64,
    #[serde(default)]
    recordings: Option<Vec<Recording>>,
}

#[derive(Debug, Deserialize)]
struct Recording {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    artists: Option<Vec<Artist>>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

impl LookupResponse {
    /// Flatten the response into one match per recording.
    ///
    /// Results without recordings carry no labels and are skipped.  Credited
    /// artists are joined with `"; "`.
    pub fn into_matches(self) -> Result<Vec<ScoredMatch>, AcoustIdError> {
        if self.status != "ok" {
            let message = self
                .error
                .map(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("status: {}", self.status));
            return Err(AcoustIdError::WebService(message));
        }

        let results = self
            .results
            .ok_or_else(|| AcoustIdError::WebService("results not included".to_string()))?;

        let mut matches = Vec::new();
        for result in results {
            let Some(recordings) = result.recordings else {
                continue;
            };
            for recording in recordings {
                let artist = recording
                    .artists
                    .filter(|a| !a.is_empty())
                    .map(|a| a.into_iter().map(|a| a.name).collect::<Vec<_>>().join("; "));
                matches.push(ScoredMatch {
                    confidence: result.score,
                    recording_id: recording.id,
                    title: recording.title,
                    artist,
                });
            }
        }
        Ok(matches)
    }
}

// ── Client ───────────────────────────────────────────────────────────────────

/// AcoustID client.  The API key is passed in explicitly.
pub struct AcoustIdClient {
    api_key: String,
    fpcalc: PathBuf,
    agent: ureq::Agent,
    rate_limiter: RateLimiter,
}

impl AcoustIdClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_fpcalc(api_key, Path::new(DEFAULT_FPCALC))
    }

    /// Create a client that runs the given `fpcalc` binary.
    pub fn with_fpcalc(api_key: &str, fpcalc: &Path) -> Self {
        Self {
            api_key: api_key.to_string(),
            fpcalc: fpcalc.to_path_buf(),
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(30))
                .user_agent(USER_AGENT)
                .build(),
            rate_limiter: RateLimiter::from_millis("AcoustID", RATE_LIMIT_MILLIS),
        }
    }

    /// Look up a fingerprint.
    pub fn lookup(&mut self, fp: &Fingerprint) -> Result<Vec<ScoredMatch>, AcoustIdError> {
        self.rate_limiter.wait_if_needed();

        let duration = (fp.duration as u64).to_string();
        debug!(duration = %duration, "querying AcoustID");

        let response = self.agent.post(LOOKUP_URL).send_form(&[
            ("format", "json"),
            ("client", self.api_key.as_str()),
            ("meta", "recordings"),
            ("duration", duration.as_str()),
            ("fingerprint", fp.fingerprint.as_str()),
        ]);

        let body: LookupResponse = match response {
            Ok(resp) => resp
                .into_json()
                .map_err(|e| AcoustIdError::WebService(format!("malformed response: {}", e)))?,
            // AcoustID reports bad keys and fingerprints as 4xx with a JSON body
            Err(ureq::Error::Status(code, resp)) => {
                self.rate_limiter.report_failure();
                return Err(match resp.into_json::<LookupResponse>() {
                    Ok(body) => body
                        .into_matches()
                        .err()
                        .unwrap_or_else(|| AcoustIdError::WebService(format!("HTTP {}", code))),
                    Err(_) => AcoustIdError::WebService(format!("HTTP {}", code)),
                });
            }
            Err(e) => {
                self.rate_limiter.report_failure();
                return Err(AcoustIdError::WebService(e.to_string()));
            }
        };

        self.rate_limiter.report_success();
        let matches = body.into_matches()?;
        info!(matches = matches.len(), "AcoustID lookup finished");
        Ok(matches)
    }

    /// Fingerprint a file and look it up.
    pub fn match_file(&mut self, path: &Path) -> Result<Vec<ScoredMatch>, AcoustIdError> {
        let fp = fingerprint_file(&self.fpcalc, path)?;
        debug!(file = %path.display(), duration = fp.duration, "computed fingerprint");
        let matches = self.lookup(&fp)?;
        if matches.is_empty() {
            warn!(file = %path.display(), "AcoustID returned no recordings");
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<ScoredMatch>, AcoustIdError> {
        serde_json::from_str::<LookupResponse>(json).unwrap().into_matches()
    }

    #[test]
    fn test_parse_fpcalc_output() {
        let fp = parse_fpcalc_output(r#"{"duration": 125.47, "fingerprint": "AQADtEmSRUmSJEkS"}"#).unwrap();
        assert_eq!(fp.duration, 125.47);
        assert_eq!(fp.fingerprint, "AQADtEmSRUmSJEkS");

        assert!(parse_fpcalc_output("DURATION=125\nFINGERPRINT=AQAD").is_err());
        assert!(parse_fpcalc_output(r#"{"duration": 1.0, "fingerprint": ""}"#).is_err());
    }

    #[test]
    fn test_lookup_response_flattens_recordings() {
        let matches = parse(
            r#"{
                "status": "ok",
                "results": [
                    {
                        "id": "9ff43b6a-4f16-427c-93c2-92307ca505e0",
                        "score": 0.97,
                        "recordings": [
                            {
                                "id": "cd2e7c47-16f5-46c6-a37c-a1eb7bf599ff",
                                "title": "Under Pressure",
                                "artists": [
                                    {"id": "0383dadf", "name": "Queen"},
                                    {"id": "5441c29d", "name": "David Bowie"}
                                ]
                            },
                            {"id": "b7a3c0a1-0000-0000-0000-000000000000", "title": "Under Pressure"}
                        ]
                    },
                    {"id": "ffffffff-0000-0000-0000-000000000000", "score": 0.5}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].confidence, 0.97);
        assert_eq!(matches[0].recording_id, "cd2e7c47-16f5-46c6-a37c-a1eb7bf599ff");
        assert_eq!(matches[0].artist.as_deref(), Some("Queen; David Bowie"));
        assert_eq!(matches[0].title.as_deref(), Some("Under Pressure"));
        assert_eq!(matches[1].artist, None);
    }

    #[test]
    fn test_lookup_response_error_status() {
        let err = parse(r#"{"status": "error", "error": {"code": 4, "message": "invalid API key"}}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "web service request failed: invalid API key");

        let err = parse(r#"{"status": "error"}"#).unwrap_err();
        assert_eq!(err.to_string(), "web service request failed: status: error");
    }

    #[test]
    fn test_lookup_response_without_results() {
        assert!(matches!(parse(r#"{"status": "ok"}"#), Err(AcoustIdError::WebService(_))));
        assert_eq!(parse(r#"{"status": "ok", "results": []}"#).unwrap().len(), 0);
    }

    #[test]
    fn test_missing_fpcalc_is_no_backend() {
        let result = fingerprint_file(
            Path::new("/nonexistent/aidmatch/fpcalc"),
            Path::new("song.mp3"),
        );
        assert!(matches!(result, Err(AcoustIdError::NoBackend { .. })));
    }
}
