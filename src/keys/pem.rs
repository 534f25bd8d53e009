//! C1 - X.509 certificate -> PEM-encoded public key.

use crate::error::AppError;
use pkcs1::EncodeRsaPublicKey;
use pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;

/// Converts one `x5c` entry (base64 DER, no PEM delimiters) plus its JWK
/// `alg` into a single-line PEM (literal `\n` separators).
///
/// Only the leaf certificate matters here; `x5c` chain certificates beyond
/// the first entry are never consulted (see `DESIGN.md`).
pub fn cert_to_pem(x5c_entry: &str, alg: &str) -> Result<String, AppError> {
    if !alg.starts_with("RS") && !alg.starts_with("ES") {
        return Err(AppError::UnsupportedAlgorithm(alg.to_string()));
    }

    let wrapped = format!("-----BEGIN CERTIFICATE-----\n{x5c_entry}\n-----END CERTIFICATE-----\n");

    let (_, cert_pem) = x509_parser::pem::parse_x509_pem(wrapped.as_bytes())
        .map_err(|e| AppError::CertificateParse(format!("invalid PEM wrapper: {e}")))?;
    let (_, cert) = cert_pem
        .parse_x509()
        .map_err(|e| AppError::CertificateParse(format!("invalid X.509 certificate: {e}")))?;

    let spki_der = cert.tbs_certificate.subject_pki.raw;

    let multi_line_pem = if alg.starts_with("RS") {
        let public_key = RsaPublicKey::from_public_key_der(spki_der)
            .map_err(|e| AppError::CertificateParse(format!("invalid RSA public key: {e}")))?;
        public_key
            .to_pkcs1_pem(pkcs1::LineEnding::LF)
            .map_err(|e| AppError::CertificateParse(format!("pkcs1 PEM encode: {e}")))?
            .to_string()
    } else {
        let pem_obj = pem::Pem::new("PUBLIC KEY", spki_der.to_vec());
        pem::encode(&pem_obj)
    };

    Ok(pem_to_single_line(&multi_line_pem))
}

/// Replaces every newline with the literal two-character escape `\n`, since
/// the destination is a JSON string value in CouchDB's config endpoint.
pub fn pem_to_single_line(pem: &str) -> String {
    pem.replace('\n', "\\n")
}
