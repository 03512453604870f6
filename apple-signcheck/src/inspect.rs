// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-path inspection pipeline.
//!
//! Queries the OS for signing metadata, walks the certificate chain, and
//! reports the resolved fields. Successes go to the output writer; every
//! failure is downgraded to a diagnostic on the error writer and contained
//! to the path that produced it. The only condition that affects the exit
//! status is a sole path whose metadata carries no certificate chain.

use {
    crate::{
        error::SignCheckError,
        signing_information::{CertificateValues, DeveloperRecord, SigningInfo},
    },
    log::debug,
    std::{
        io::Write,
        path::{Path, PathBuf},
    },
};

/// Inspect each path in order and report developer certificate information.
///
/// `query` obtains the signing metadata for a single path; it is a parameter
/// so the pipeline can be driven without an OS trust store. Returns the
/// process exit code.
pub fn inspect_paths<Q, O, E>(
    paths: &[PathBuf],
    query: Q,
    out: &mut O,
    err: &mut E,
) -> Result<i32, SignCheckError>
where
    Q: Fn(&Path) -> Result<SigningInfo, SignCheckError>,
    O: Write,
    E: Write,
{
    let mut exit_code = 0;

    for path in paths {
        debug!("inspecting {}", path.display());

        let info = match query(path) {
            Ok(info) => info,
            Err(e) => {
                writeln!(err, "error checking {}: {}", path.display(), e)?;
                continue;
            }
        };

        match &info.certificates {
            Some(certificates) => {
                print_developer_certificate_info(
                    path,
                    certificates,
                    info.team_identifier.as_deref(),
                    out,
                    err,
                )?;
            }
            None => {
                writeln!(
                    err,
                    "no certificates found in signing information for {}",
                    path.display()
                )?;

                if paths.len() == 1 {
                    exit_code = 1;
                }
            }
        }
    }

    Ok(exit_code)
}

fn print_developer_certificate_info(
    path: &Path,
    certificates: &[CertificateValues],
    team_identifier: Option<&str>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<(), SignCheckError> {
    if certificates.is_empty() {
        writeln!(err, "no certificates found for {}", path.display())?;
        return Ok(());
    }

    writeln!(out, "App: {}", path.display())?;

    for (i, certificate) in certificates.iter().enumerate() {
        debug!("examining certificate {}", i);

        let record = DeveloperRecord::from_certificate(certificate, team_identifier);

        match &record.fingerprint {
            Some(fingerprint) => writeln!(out, "SHA-256 Fingerprint: {}", fingerprint)?,
            None => writeln!(
                err,
                "failed to get SHA-256 fingerprint for {}",
                path.display()
            )?,
        }

        match &record.developer_id {
            Some(id) => writeln!(out, "Developer ID: {}", id)?,
            None => writeln!(err, "failed to get developer ID for {}", path.display())?,
        }

        match record.display_name() {
            Some(name) => writeln!(out, "Developer Name: {}", name)?,
            None => writeln!(err, "failed to get developer name for {}", path.display())?,
        }

        // Later certificates are only consulted while information is still
        // missing.
        if record.is_complete() {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::signing_information::{
            Property, PropertyValue, FINGERPRINTS_KEY, OID_COMMON_NAME, OID_SUBJECT_NAME,
            OID_USER_ID, SHA256_FINGERPRINT_LABEL,
        },
        indoc::indoc,
    };

    fn certificate(digest_byte: u8, user_id: &str, common_name: &str) -> CertificateValues {
        [
            (
                FINGERPRINTS_KEY.to_string(),
                PropertyValue::Section(vec![Property {
                    label: SHA256_FINGERPRINT_LABEL.to_string(),
                    value: PropertyValue::Data(vec![digest_byte; 32]),
                }]),
            ),
            (
                OID_SUBJECT_NAME.to_string(),
                PropertyValue::Section(vec![
                    Property {
                        label: OID_USER_ID.to_string(),
                        value: PropertyValue::String(user_id.to_string()),
                    },
                    Property {
                        label: OID_COMMON_NAME.to_string(),
                        value: PropertyValue::String(common_name.to_string()),
                    },
                ]),
            ),
        ]
        .into_iter()
        .collect()
    }

    fn fingerprint_only_certificate(digest_byte: u8) -> CertificateValues {
        [(
            FINGERPRINTS_KEY.to_string(),
            PropertyValue::Section(vec![Property {
                label: SHA256_FINGERPRINT_LABEL.to_string(),
                value: PropertyValue::Data(vec![digest_byte; 32]),
            }]),
        )]
        .into_iter()
        .collect()
    }

    fn signed_info() -> SigningInfo {
        SigningInfo {
            team_identifier: Some("TEAM456".to_string()),
            certificates: Some(vec![certificate(
                0xab,
                "DEADBEEF99",
                "Developer ID Application: Example Corp",
            )]),
        }
    }

    fn run<Q>(paths: &[&str], query: Q) -> (i32, String, String)
    where
        Q: Fn(&Path) -> Result<SigningInfo, SignCheckError>,
    {
        let paths: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
        let mut out = Vec::new();
        let mut err = Vec::new();

        let exit_code = inspect_paths(&paths, query, &mut out, &mut err).unwrap();

        (
            exit_code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn fully_resolved_certificate_prints_all_fields() {
        let (exit_code, stdout, stderr) = run(&["/apps/example.app"], |_| Ok(signed_info()));

        assert_eq!(exit_code, 0);
        assert_eq!(
            stdout,
            indoc! {"
                App: /apps/example.app
                SHA-256 Fingerprint: abababababababababababababababababababababababababababababababab
                Developer ID: DEADBEEF99
                Developer Name: Example Corp
            "}
        );
        assert!(stderr.is_empty());
    }

    #[test]
    fn single_path_without_certificate_chain_exits_nonzero() {
        let (exit_code, stdout, stderr) =
            run(&["/apps/unsigned.app"], |_| Ok(SigningInfo::default()));

        assert_eq!(exit_code, 1);
        assert!(stdout.is_empty());
        assert!(stderr
            .contains("no certificates found in signing information for /apps/unsigned.app"));
    }

    #[test]
    fn unsigned_path_among_multiple_does_not_fail_the_run() {
        let query = |path: &Path| {
            if path.to_str() == Some("/apps/unsigned.app") {
                Ok(SigningInfo::default())
            } else {
                Ok(signed_info())
            }
        };

        let (exit_code, stdout, stderr) = run(&["/apps/unsigned.app", "/apps/example.app"], query);

        assert_eq!(exit_code, 0);
        assert!(stdout.contains("App: /apps/example.app"));
        assert!(stderr
            .contains("no certificates found in signing information for /apps/unsigned.app"));
    }

    #[test]
    fn query_failure_is_contained_to_its_path() {
        let query = |path: &Path| {
            if path.to_str() == Some("/apps/broken.app") {
                // errSecCSUnsigned
                Err(SignCheckError::StaticCodeCreate(-67062))
            } else {
                Ok(signed_info())
            }
        };

        let (exit_code, stdout, stderr) = run(&["/apps/broken.app", "/apps/example.app"], query);

        assert_eq!(exit_code, 0);
        assert!(stdout.contains("App: /apps/example.app"));
        assert!(stderr.contains("error checking /apps/broken.app"));
        assert!(stderr.contains("-67062"));
    }

    #[test]
    fn empty_certificate_chain_is_a_diagnostic_only() {
        let (exit_code, stdout, stderr) = run(&["/apps/example.app"], |_| {
            Ok(SigningInfo {
                team_identifier: None,
                certificates: Some(vec![]),
            })
        });

        assert_eq!(exit_code, 0);
        assert!(stdout.is_empty());
        assert!(stderr.contains("no certificates found for /apps/example.app"));
    }

    #[test]
    fn chain_walk_stops_at_first_complete_certificate() {
        let (exit_code, stdout, stderr) = run(&["/apps/example.app"], |_| {
            Ok(SigningInfo {
                team_identifier: None,
                certificates: Some(vec![
                    certificate(0xab, "FIRST11111", "First Corp"),
                    certificate(0xcd, "SECOND2222", "Second Corp"),
                ]),
            })
        });

        assert_eq!(exit_code, 0);
        assert!(stdout.contains("Developer ID: FIRST11111"));
        assert!(!stdout.contains("SECOND2222"));
        assert!(!stdout.contains("cdcdcd"));
        assert_eq!(stdout.matches("Developer ID:").count(), 1);
        assert!(stderr.is_empty());
    }

    #[test]
    fn incomplete_certificate_falls_through_to_the_next() {
        let (_, stdout, stderr) = run(&["/apps/example.app"], |_| {
            Ok(SigningInfo {
                team_identifier: None,
                certificates: Some(vec![
                    fingerprint_only_certificate(0xab),
                    certificate(0xcd, "SECOND2222", "Second Corp"),
                ]),
            })
        });

        assert_eq!(
            stdout,
            indoc! {"
                App: /apps/example.app
                SHA-256 Fingerprint: abababababababababababababababababababababababababababababababab
                SHA-256 Fingerprint: cdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcd
                Developer ID: SECOND2222
                Developer Name: Second Corp
            "}
        );
        assert!(stderr.contains("failed to get developer ID for /apps/example.app"));
        assert!(stderr.contains("failed to get developer name for /apps/example.app"));
    }

    #[test]
    fn missing_fingerprint_is_reported_but_not_fatal() {
        let (exit_code, stdout, stderr) = run(&["/apps/example.app"], |_| {
            Ok(SigningInfo {
                team_identifier: Some("TEAM456".to_string()),
                certificates: Some(vec![[(
                    OID_SUBJECT_NAME.to_string(),
                    PropertyValue::Section(vec![Property {
                        label: OID_COMMON_NAME.to_string(),
                        value: PropertyValue::String("Example Corp".to_string()),
                    }]),
                )]
                .into_iter()
                .collect()]),
            })
        });

        assert_eq!(exit_code, 0);
        assert_eq!(
            stdout,
            indoc! {"
                App: /apps/example.app
                Developer ID: TEAM456
                Developer Name: Example Corp
            "}
        );
        assert!(stderr.contains("failed to get SHA-256 fingerprint for /apps/example.app"));
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let query = |_: &Path| Ok(signed_info());

        let first = run(&["/apps/example.app"], query);
        let second = run(&["/apps/example.app"], query);

        assert_eq!(first, second);
    }
}
