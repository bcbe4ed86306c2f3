//! Local key material: Ed25519 SSH key pairs and a Docker mutual-TLS bundle.

use anyhow::Result;
use chrono::{Datelike, Duration as ChronoDuration, Utc};
use rcgen::{
    BasicConstraints, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    KeyUsagePurpose,
};
use russh::keys::ssh_key::private::{Ed25519Keypair, KeypairData};
use russh::keys::ssh_key::{LineEnding, PrivateKey};
use tracing::debug;

use crate::application::ports::CredentialGenerator;
use crate::domain::error::CredentialError;
use crate::domain::credentials::KEY_PASSPHRASE_ENV;
use crate::domain::{SshKeyPair, TlsBundle};

const CA_VALID_DAYS: i64 = 3650;
const LEAF_VALID_DAYS: i64 = 365;

pub struct LocalKeyGenerator;

fn generation(what: &str, e: impl std::fmt::Display) -> CredentialError {
    CredentialError::Generation {
        what: what.to_string(),
        reason: e.to_string(),
    }
}

fn validity(params: &mut CertificateParams, days: i64) {
    let now = Utc::now();
    let until = now + ChronoDuration::days(days);
    // Date granularity; backdate a day so fresh certificates are valid on
    // hosts with a slightly slow clock.
    let from = now - ChronoDuration::days(1);
    params.not_before = rcgen::date_time_ymd(from.year(), month(from.month()), day(from.day()));
    params.not_after = rcgen::date_time_ymd(until.year(), month(until.month()), day(until.day()));
}

fn month(m: u32) -> u8 {
    u8::try_from(m).unwrap_or(1)
}

fn day(d: u32) -> u8 {
    u8::try_from(d).unwrap_or(1)
}

fn leaf(
    subject_names: Vec<String>,
    common_name: &str,
    usage: ExtendedKeyUsagePurpose,
    ca: &rcgen::Certificate,
    ca_key: &KeyPair,
) -> Result<(String, String), CredentialError> {
    let mut params =
        CertificateParams::new(subject_names).map_err(|e| generation("certificate names", e))?;
    params.distinguished_name.push(DnType::CommonName, common_name);
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![usage];
    validity(&mut params, LEAF_VALID_DAYS);
    let key = KeyPair::generate().map_err(|e| generation("leaf key", e))?;
    let cert = params
        .signed_by(&key, ca, ca_key)
        .map_err(|e| generation("signing certificate", e))?;
    Ok((cert.pem(), key.serialize_pem()))
}

impl CredentialGenerator for LocalKeyGenerator {
    fn ssh_key_pair(&self, passphrase: Option<&str>, comment: &str) -> Result<SshKeyPair> {
        let seed: [u8; 32] = rand::random();
        let keypair = Ed25519Keypair::from_seed(&seed);
        let mut private = PrivateKey::new(KeypairData::from(keypair), comment)
            .map_err(|e| generation("ssh key", e))?;
        let public_key = private
            .public_key()
            .to_openssh()
            .map_err(|e| generation("ssh public key", e))?;
        if let Some(pass) = passphrase.filter(|p| !p.is_empty()) {
            private = private
                .encrypt(&mut rand::rngs::OsRng, pass)
                .map_err(|e| generation("encrypting ssh key", e))?;
        }
        let private_key = private
            .to_openssh(LineEnding::LF)
            .map_err(|e| generation("ssh private key", e))?
            .to_string();
        debug!(comment, encrypted = passphrase.is_some(), "generated ssh key pair");
        Ok(SshKeyPair {
            private_key,
            public_key,
        })
    }

    fn check_private_key(&self, private_key: &str, passphrase: Option<&str>) -> Result<()> {
        let passphrase = passphrase.filter(|p| !p.is_empty());
        let encrypted = PrivateKey::from_openssh(private_key).is_ok_and(|k| k.is_encrypted());
        if encrypted && passphrase.is_none() {
            return Err(CredentialError::InvalidKey(format!(
                "the private key is encrypted; set {KEY_PASSPHRASE_ENV}"
            ))
            .into());
        }
        russh::keys::decode_secret_key(private_key, passphrase)
            .map_err(|e| CredentialError::InvalidKey(e.to_string()))?;
        Ok(())
    }

    fn tls_bundle(&self, subject_names: &[String]) -> Result<TlsBundle> {
        let Some(primary) = subject_names.first() else {
            return Err(generation("tls bundle", "no host names given").into());
        };

        let mut ca_params = CertificateParams::new(Vec::<String>::new())
            .map_err(|e| generation("ca parameters", e))?;
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params
            .distinguished_name
            .push(DnType::CommonName, format!("{primary} CA"));
        ca_params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        validity(&mut ca_params, CA_VALID_DAYS);
        let ca_key = KeyPair::generate().map_err(|e| generation("ca key", e))?;
        let ca_cert = ca_params
            .self_signed(&ca_key)
            .map_err(|e| generation("self-signing ca", e))?;

        let (server_cert, server_key) = leaf(
            subject_names.to_vec(),
            primary,
            ExtendedKeyUsagePurpose::ServerAuth,
            &ca_cert,
            &ca_key,
        )?;
        let (client_cert, client_key) = leaf(
            Vec::new(),
            "client",
            ExtendedKeyUsagePurpose::ClientAuth,
            &ca_cert,
            &ca_key,
        )?;
        debug!(names = ?subject_names, "issued tls bundle");

        Ok(TlsBundle {
            ca_cert: ca_cert.pem(),
            ca_key: ca_key.serialize_pem(),
            server_cert,
            server_key,
            client_cert,
            client_key,
        })
    }
}
