// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data model for OS-provided code signing metadata.
//!
//! The trust subsystem hands back a team identifier plus a chain of
//! certificates, each described as a table of attribute values keyed by
//! well-known identifiers. The types here mirror that shape without tying
//! the extraction rules to any platform API, so the lookup logic can be
//! exercised on every OS.

use {
    crate::error::SignCheckError,
    std::{collections::BTreeMap, path::Path},
};

/// Subject distinguished name sequence (kSecOIDX509V1SubjectName).
pub const OID_SUBJECT_NAME: &str = "2.16.840.1.113741.2.1.1.1.8";

/// UserID.
///
/// Apple puts the team identifier in this subject attribute on Developer ID
/// certificates.
pub const OID_USER_ID: &str = "0.9.2342.19200300.100.1.1";

/// serialNumber.
pub const OID_SERIAL_NUMBER: &str = "2.5.4.5";

/// commonName.
pub const OID_COMMON_NAME: &str = "2.5.4.3";

/// Key under which certificate digests are grouped in the attribute table.
pub const FINGERPRINTS_KEY: &str = "Fingerprints";

/// Label of the SHA-256 entry within the fingerprints group.
pub const SHA256_FINGERPRINT_LABEL: &str = "SHA-256";

/// Common name prefix on Developer ID signing certificates.
const DEVELOPER_ID_APPLICATION_PREFIX: &str = "Developer ID Application: ";

/// Code signing metadata for a single path.
///
/// Both fields are optional in the OS response. `certificates: None` means
/// the metadata carried no certificate chain at all, which is reported
/// differently from an empty chain.
#[derive(Clone, Debug, Default)]
pub struct SigningInfo {
    pub team_identifier: Option<String>,
    pub certificates: Option<Vec<CertificateValues>>,
}

/// A single attribute value from a certificate's descriptive table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyValue {
    String(String),
    Data(Vec<u8>),
    Section(Vec<Property>),
}

/// A labeled entry within a [PropertyValue::Section].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub label: String,
    pub value: PropertyValue,
}

/// Descriptive attribute values for one certificate, keyed by attribute
/// identifier (an OID string or a well-known group key).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertificateValues {
    properties: BTreeMap<String, PropertyValue>,
}

impl FromIterator<(String, PropertyValue)> for CertificateValues {
    fn from_iter<T: IntoIterator<Item = (String, PropertyValue)>>(iter: T) -> Self {
        Self {
            properties: iter.into_iter().collect(),
        }
    }
}

impl CertificateValues {
    pub fn get(&self, identifier: &str) -> Option<&PropertyValue> {
        self.properties.get(identifier)
    }

    /// Raw SHA-256 digest of the certificate, if the fingerprints group has
    /// an entry for it.
    pub fn sha256_fingerprint(&self) -> Option<&[u8]> {
        let Some(PropertyValue::Section(fingerprints)) = self.get(FINGERPRINTS_KEY) else {
            return None;
        };

        fingerprints.iter().find_map(|entry| {
            if entry.label == SHA256_FINGERPRINT_LABEL {
                if let PropertyValue::Data(digest) = &entry.value {
                    return Some(digest.as_slice());
                }
            }

            None
        })
    }

    /// Scan the subject distinguished name sequence for an identifier
    /// (UserID or serialNumber attribute) and a display name (commonName
    /// attribute). The first match for each wins.
    fn subject_name_components(&self) -> (Option<&str>, Option<&str>) {
        let mut id = None;
        let mut name = None;

        if let Some(PropertyValue::Section(attributes)) = self.get(OID_SUBJECT_NAME) {
            for attribute in attributes {
                let PropertyValue::String(value) = &attribute.value else {
                    continue;
                };

                match attribute.label.as_str() {
                    OID_USER_ID | OID_SERIAL_NUMBER if id.is_none() => id = Some(value.as_str()),
                    OID_COMMON_NAME if name.is_none() => name = Some(value.as_str()),
                    _ => {}
                }
            }
        }

        (id, name)
    }

    fn top_level_string(&self, identifier: &str) -> Option<&str> {
        match self.get(identifier) {
            Some(PropertyValue::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Developer summary derived from one certificate plus the optional team
/// identifier from the signing metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeveloperRecord {
    /// Lowercase hex SHA-256 fingerprint.
    pub fingerprint: Option<String>,
    pub developer_id: Option<String>,
    pub developer_name: Option<String>,
}

impl DeveloperRecord {
    /// Derive a record from a certificate's attribute values.
    ///
    /// The identifier resolution order is: subject name sequence match,
    /// then the team identifier, then a top-level serialNumber lookup. The
    /// display name comes from the subject name sequence with a top-level
    /// commonName fallback.
    pub fn from_certificate(
        values: &CertificateValues,
        team_identifier: Option<&str>,
    ) -> Self {
        let fingerprint = values.sha256_fingerprint().map(hex::encode);

        let (subject_id, subject_name) = values.subject_name_components();

        let mut developer_id = subject_id
            .map(str::to_string)
            .or_else(|| team_identifier.map(str::to_string));
        if developer_id.is_none() {
            developer_id = values.top_level_string(OID_SERIAL_NUMBER).map(str::to_string);
        }

        let mut developer_name = subject_name.map(str::to_string);
        if developer_name.is_none() {
            developer_name = values.top_level_string(OID_COMMON_NAME).map(str::to_string);
        }

        Self {
            fingerprint,
            developer_id,
            developer_name,
        }
    }

    /// Whether this record carries enough information to stop walking the
    /// certificate chain. The fingerprint is reported per certificate and
    /// does not participate.
    pub fn is_complete(&self) -> bool {
        self.developer_id.is_some() && self.developer_name.is_some()
    }

    /// Display name with the Developer ID certificate prefix stripped.
    ///
    /// Everything up to and including the first occurrence of the prefix is
    /// dropped; names without the prefix are returned unchanged.
    pub fn display_name(&self) -> Option<&str> {
        self.developer_name.as_deref().map(|name| {
            match name.find(DEVELOPER_ID_APPLICATION_PREFIX) {
                Some(index) => &name[index + DEVELOPER_ID_APPLICATION_PREFIX.len()..],
                None => name,
            }
        })
    }
}

/// Obtain signing information for a filesystem path from the OS trust
/// subsystem.
#[cfg(target_os = "macos")]
pub fn query_path(path: &Path) -> Result<SigningInfo, SignCheckError> {
    crate::macos::query_signing_information(path)
}

/// Obtain signing information for a filesystem path from the OS trust
/// subsystem.
#[cfg(not(target_os = "macos"))]
pub fn query_path(_path: &Path) -> Result<SigningInfo, SignCheckError> {
    Err(SignCheckError::UnsupportedPlatform)
}
