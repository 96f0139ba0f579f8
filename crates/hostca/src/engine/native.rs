//! Certificate engine backed by `rcgen` (signing) and `x509-parser` (parsing).

use chrono::{DateTime, TimeZone, Utc};
use rcgen::string::Ia5String;
use rcgen::{
    BasicConstraints, CertificateParams, CertificateSigningRequestParams, DistinguishedName,
    DnType, ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair, KeyUsagePurpose, SanType,
    SerialNumber,
};
use ring::digest::{digest, SHA256};
use time::OffsetDateTime;
use tracing::debug;
use x509_parser::prelude::{FromDer, X509CertificationRequest, X509Name};

use hostca_core::{CaError, CertificateInfo, Result};

use super::{CertificateEngine, IssueParams, SigningRequest};
use crate::CaIdentity;

const CSR_TAGS: &[&str] = &["CERTIFICATE REQUEST", "NEW CERTIFICATE REQUEST"];

/// Production engine: ECDSA P-256 keys, X.509 v3 certificates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RcgenEngine;

impl RcgenEngine {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CertificateEngine for RcgenEngine {
    fn parse_request(&self, csr_pem: &str) -> Result<SigningRequest> {
        let block = pem::parse(csr_pem.as_bytes())
            .map_err(|e| CaError::MalformedRequest(e.to_string()))?;
        if !CSR_TAGS.contains(&block.tag()) {
            return Err(CaError::MalformedRequest(format!(
                "expected a certificate request, found {}",
                block.tag()
            )));
        }

        let (_, csr) = X509CertificationRequest::from_der(block.contents())
            .map_err(|e| CaError::MalformedRequest(e.to_string()))?;
        csr.verify_signature()
            .map_err(|e| CaError::MalformedRequest(format!("signature check failed: {e}")))?;

        let subject = common_name(&csr.certification_request_info.subject)
            .ok_or_else(|| CaError::MalformedRequest("request has no common name".into()))?;

        Ok(SigningRequest {
            subject,
            pem: csr_pem.to_string(),
        })
    }

    fn sign(
        &self,
        request: &SigningRequest,
        ca: &CaIdentity,
        params: &IssueParams,
    ) -> Result<String> {
        let mut csr = CertificateSigningRequestParams::from_pem(&request.pem)
            .map_err(|e| CaError::MalformedRequest(e.to_string()))?;

        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, params.common_name.as_str());
        csr.params.distinguished_name = dn;

        // SANs requested by the agent are replaced, never trusted
        let dns_name = Ia5String::try_from(params.common_name.clone())
            .map_err(|e| CaError::Signing(format!("invalid DNS name: {e}")))?;
        csr.params.subject_alt_names = vec![SanType::DnsName(dns_name)];

        csr.params.is_ca = IsCa::NoCa;
        csr.params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        csr.params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];
        csr.params.not_before = to_offset(params.not_before)?;
        csr.params.not_after = to_offset(params.not_after)?;
        csr.params.serial_number = Some(SerialNumber::from(params.serial));
        csr.params.use_authority_key_identifier_extension = true;

        let ca_key = KeyPair::from_pem(ca.key_pem())
            .map_err(|e| CaError::Identity(format!("failed to parse CA key: {e}")))?;
        let issuer = Issuer::from_ca_cert_pem(ca.certificate_pem(), &ca_key)
            .map_err(|e| CaError::Identity(format!("failed to load CA certificate: {e}")))?;

        let cert = csr
            .signed_by(&issuer)
            .map_err(|e| CaError::Signing(e.to_string()))?;

        debug!(subject = %params.common_name, serial = params.serial, "signed certificate");
        Ok(cert.pem())
    }

    fn generate_ca(&self, params: &IssueParams) -> Result<CaIdentity> {
        let key_pair = KeyPair::generate().map_err(|e| CaError::Identity(e.to_string()))?;

        let mut ca = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, params.common_name.as_str());
        ca.distinguished_name = dn;

        ca.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));
        ca.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        ca.not_before = to_offset(params.not_before)?;
        ca.not_after = to_offset(params.not_after)?;
        ca.serial_number = Some(SerialNumber::from(params.serial));

        let certificate = ca
            .self_signed(&key_pair)
            .map_err(|e| CaError::Identity(e.to_string()))?;

        Ok(CaIdentity::new(
            params.common_name.clone(),
            certificate.pem(),
            key_pair.serialize_pem(),
        ))
    }

    fn generate_request(&self, hostname: &str) -> Result<(String, String)> {
        let key_pair = KeyPair::generate().map_err(|e| CaError::Signing(e.to_string()))?;

        let mut params = CertificateParams::new(vec![hostname.to_string()])
            .map_err(|e| CaError::Signing(e.to_string()))?;
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, hostname);
        params.distinguished_name = dn;

        let csr = params
            .serialize_request(&key_pair)
            .map_err(|e| CaError::Signing(e.to_string()))?;
        let csr_pem = csr.pem().map_err(|e| CaError::Signing(e.to_string()))?;

        Ok((key_pair.serialize_pem(), csr_pem))
    }

    fn inspect(&self, certificate_pem: &str) -> Result<CertificateInfo> {
        let block = pem::parse(certificate_pem.as_bytes())
            .map_err(|e| CaError::CertParse(e.to_string()))?;
        if block.tag() != "CERTIFICATE" {
            return Err(CaError::CertParse(format!(
                "expected a certificate, found {}",
                block.tag()
            )));
        }

        let der = block.contents();
        let (_, cert) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| CaError::CertParse(e.to_string()))?;

        Ok(CertificateInfo {
            subject: common_name(cert.subject()).unwrap_or_else(|| cert.subject().to_string()),
            issuer: common_name(cert.issuer()).unwrap_or_else(|| cert.issuer().to_string()),
            serial: format!("{:X}", cert.serial),
            not_before: asn1_to_utc(cert.validity().not_before)?,
            not_after: asn1_to_utc(cert.validity().not_after)?,
            fingerprint: hex::encode(digest(&SHA256, der).as_ref()),
        })
    }
}

fn common_name(name: &X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}

fn to_offset(at: DateTime<Utc>) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(at.timestamp())
        .map_err(|e| CaError::Signing(format!("validity date out of range: {e}")))
}

/// Convert an ASN.1 `GeneralizedTime` / `UTCTime` to `DateTime<Utc>`.
fn asn1_to_utc(t: x509_parser::time::ASN1Time) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(t.timestamp(), 0)
        .single()
        .ok_or_else(|| CaError::CertParse(format!("validity time {t} out of range")))
}
