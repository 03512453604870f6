// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Functionality that only works on macOS.
//!
//! Binds the Security framework's static code APIs and converts their Core
//! Foundation output into the crate's platform-neutral signing information
//! model. Trust evaluation and certificate parsing stay on the OS side of
//! this boundary.

use {
    crate::{
        error::SignCheckError,
        signing_information::{CertificateValues, Property, PropertyValue, SigningInfo},
    },
    core_foundation::{
        array::CFArray,
        base::{CFType, TCFType},
        data::CFData,
        dictionary::CFDictionary,
        string::CFString,
        url::CFURL,
    },
    core_foundation_sys::{
        array::CFArrayRef,
        base::{CFTypeRef, OSStatus},
        dictionary::CFDictionaryRef,
        error::CFErrorRef,
        string::CFStringRef,
        url::CFURLRef,
    },
    log::debug,
    security_framework::certificate::SecCertificate,
    security_framework_sys::base::{errSecSuccess, SecCertificateRef},
    std::path::Path,
};

/// `SecStaticCodeRef` from the Security framework.
type SecStaticCodeRef = CFTypeRef;

/// `SecCSFlags` from the Security framework.
type SecCSFlags = u32;

/// kSecCSDefaultFlags.
const SEC_CS_DEFAULT_FLAGS: SecCSFlags = 0;

/// kSecCSSigningInformation.
const SEC_CS_SIGNING_INFORMATION: SecCSFlags = 1 << 1;

#[allow(non_snake_case, non_upper_case_globals)]
#[link(name = "Security", kind = "framework")]
extern "C" {
    static kSecCodeInfoCertificates: CFStringRef;
    static kSecCodeInfoTeamIdentifier: CFStringRef;
    static kSecPropertyKeyLabel: CFStringRef;
    static kSecPropertyKeyValue: CFStringRef;

    fn SecStaticCodeCreateWithPath(
        path: CFURLRef,
        flags: SecCSFlags,
        static_code: *mut SecStaticCodeRef,
    ) -> OSStatus;

    fn SecCodeCopySigningInformation(
        code: SecStaticCodeRef,
        flags: SecCSFlags,
        information: *mut CFDictionaryRef,
    ) -> OSStatus;

    fn SecCertificateCopyValues(
        certificate: SecCertificateRef,
        keys: CFArrayRef,
        error: *mut CFErrorRef,
    ) -> CFDictionaryRef;
}

/// Obtain code signing information for a filesystem path.
///
/// Resolves the path to a static code object and copies its signing
/// information dictionary, extracting the team identifier and the
/// certificate chain when present.
pub fn query_signing_information(path: &Path) -> Result<SigningInfo, SignCheckError> {
    let url = CFURL::from_path(path, path.is_dir())
        .ok_or_else(|| SignCheckError::PathAsUrl(path.to_path_buf()))?;

    let mut static_code: SecStaticCodeRef = std::ptr::null();
    let status = unsafe {
        SecStaticCodeCreateWithPath(
            url.as_concrete_TypeRef(),
            SEC_CS_DEFAULT_FLAGS,
            &mut static_code,
        )
    };
    if status != errSecSuccess || static_code.is_null() {
        return Err(SignCheckError::StaticCodeCreate(status));
    }

    // Take ownership so the code object is released on every path out.
    let static_code = unsafe { CFType::wrap_under_create_rule(static_code) };

    let mut information: CFDictionaryRef = std::ptr::null();
    let status = unsafe {
        SecCodeCopySigningInformation(
            static_code.as_CFTypeRef(),
            SEC_CS_SIGNING_INFORMATION,
            &mut information,
        )
    };
    if status != errSecSuccess || information.is_null() {
        return Err(SignCheckError::SigningInformationCopy(status));
    }

    let information: CFDictionary<CFType, CFType> =
        unsafe { CFDictionary::wrap_under_create_rule(information) };

    let team_identifier = find(&information, unsafe { kSecCodeInfoTeamIdentifier })
        .and_then(|value| value.downcast::<CFString>())
        .map(|value| value.to_string());

    let certificates = find(&information, unsafe { kSecCodeInfoCertificates })
        .and_then(|value| value.downcast::<CFArray<CFType>>())
        .map(|certificates| {
            certificates
                .iter()
                .map(|certificate| copy_certificate_values(&certificate))
                .collect()
        });

    Ok(SigningInfo {
        team_identifier,
        certificates,
    })
}

/// Copy the descriptive attribute values of a certificate into the neutral
/// model. A certificate whose values cannot be copied yields an empty table.
fn copy_certificate_values(certificate: &CFType) -> CertificateValues {
    let certificate = unsafe {
        SecCertificate::wrap_under_get_rule(certificate.as_CFTypeRef() as SecCertificateRef)
    };

    debug!("reading certificate values: {}", certificate.subject_summary());

    let values = unsafe {
        SecCertificateCopyValues(
            certificate.as_concrete_TypeRef(),
            std::ptr::null(),
            std::ptr::null_mut(),
        )
    };
    if values.is_null() {
        return CertificateValues::default();
    }

    let values: CFDictionary<CFType, CFType> =
        unsafe { CFDictionary::wrap_under_create_rule(values) };

    let (keys, entries) = values.get_keys_and_values();

    keys.iter()
        .zip(entries.iter())
        .filter_map(|(key, entry)| {
            let key = unsafe { CFType::wrap_under_get_rule(*key) }
                .downcast::<CFString>()?
                .to_string();
            let entry = unsafe { CFType::wrap_under_get_rule(*entry) }
                .downcast::<CFDictionary<CFType, CFType>>()?;
            let value = convert_value(&find(&entry, unsafe { kSecPropertyKeyValue })?)?;

            Some((key, value))
        })
        .collect()
}

fn find(dictionary: &CFDictionary<CFType, CFType>, key: CFStringRef) -> Option<CFType> {
    let key = unsafe { CFString::wrap_under_get_rule(key) };

    dictionary
        .find(&key.as_CFType())
        .map(|value| (*value).clone())
}

fn convert_value(value: &CFType) -> Option<PropertyValue> {
    if let Some(string) = value.downcast::<CFString>() {
        Some(PropertyValue::String(string.to_string()))
    } else if let Some(data) = value.downcast::<CFData>() {
        Some(PropertyValue::Data(data.bytes().to_vec()))
    } else if let Some(entries) = value.downcast::<CFArray<CFType>>() {
        let section = entries
            .iter()
            .filter_map(|entry| {
                let entry = entry.downcast::<CFDictionary<CFType, CFType>>()?;
                let label = find(&entry, unsafe { kSecPropertyKeyLabel })?
                    .downcast::<CFString>()?
                    .to_string();
                let value = convert_value(&find(&entry, unsafe { kSecPropertyKeyValue })?)?;

                Some(Property { label, value })
            })
            .collect();

        Some(PropertyValue::Section(section))
    } else {
        None
    }
}
