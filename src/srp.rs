// SRP routine adapted from https://github.com/pvizeli/pycognito (aws_srp.py),
// itself derived from https://github.com/capless/warrant
//
// Apache License 2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Secure Remote Password proof for Cognito user pools.
//!
//! Cognito runs SRP-6a over the RFC 3526 3072-bit group with SHA-256 and a
//! couple of quirks of its own: hex values are sign-padded before hashing,
//! the password is salted with the pool name, and the session key goes
//! through a one-block HKDF before signing the server's secret block.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const N_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74",
    "020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F1437",
    "4FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A163BF05",
    "98DA48361C55D39A69163FA8FD24CF5F83655D23DCA3AD961C62F356208552BB",
    "9ED529077096966D670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B",
    "E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF695581718",
    "3995497CEA956AE515D2261898FA051015728E5A8AAAC42DAD33170D04507A33",
    "A85521ABDF1CBA64ECFB850458DBEF0A8AEA71575D060C7DB3970F85A6E1E4C7",
    "ABF5AE8CDB0933D71E8C94E04A25619DCEE3D2261AD2EE6BF12FFA06D98A0864",
    "D87602733EC86A64521F2B18177B200CBBE117577A615D6C770988C0BAD946E2",
    "08E24FA074E5AB3143DB5BFCE0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF",
);
const INFO_BITS: &[u8] = b"Caldera Derived Key\x01";

#[derive(Error, Debug)]
pub enum Error {
    #[error("challenge parameter {0} is not valid hex")]
    InvalidParameter(&'static str),

    #[error("bad hex value: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("secret block is not valid base64: {0}")]
    SecretBlock(#[from] base64::DecodeError),

    #[error("server sent SRP_B = 0 mod N")]
    UnsafeServerKey,

    #[error("scrambling parameter is zero")]
    ZeroScrambler,

    #[error("derived key rejected by HMAC")]
    Key,
}

/// Client side of one SRP exchange. A fresh one is needed per login.
pub struct Srp {
    n: BigUint,
    g: BigUint,
    k: BigUint,
    a: BigUint,
    big_a: BigUint,
}

impl Srp {
    pub fn new() -> Srp {
        let mut rng = rand::thread_rng();
        loop {
            let mut buf = [0u8; 128];
            rng.fill_bytes(&mut buf);
            let srp = Srp::with_secret(BigUint::from_bytes_be(&buf));
            if srp.big_a.bits() != 0 {
                return srp;
            }
        }
    }

    pub fn with_secret(a: BigUint) -> Srp {
        let n = BigUint::parse_bytes(N_HEX.as_bytes(), 16).expect("N_HEX is a valid hex constant");
        let g = BigUint::from(2u32);
        let k = BigUint::from_bytes_be(&Sha256::digest(
            hex::decode(format!("{}{}", pad(&hex_of(&n)), pad(&hex_of(&g))))
                .expect("padded group parameters are valid hex"),
        ));
        let a = a % &n;
        let big_a = g.modpow(&a, &n);
        Srp { n, g, k, a, big_a }
    }

    /// `A` as Cognito expects it in the `SRP_A` auth parameter.
    pub fn srp_a(&self) -> String {
        hex_of(&self.big_a)
    }

    /// Computes `PASSWORD_CLAIM_SIGNATURE` for a `PASSWORD_VERIFIER` challenge.
    #[allow(clippy::too_many_arguments)]
    pub fn password_claim(
        &self,
        pool_name: &str,
        user_id: &str,
        password: &str,
        salt: &str,
        srp_b: &str,
        secret_block: &str,
        timestamp: &str,
    ) -> Result<String, Error> {
        let big_b = BigUint::parse_bytes(srp_b.as_bytes(), 16)
            .ok_or(Error::InvalidParameter("SRP_B"))?;
        if (&big_b % &self.n).bits() == 0 {
            return Err(Error::UnsafeServerKey);
        }

        let u = BigUint::from_bytes_be(&Sha256::digest(hex::decode(format!(
            "{}{}",
            pad(&hex_of(&self.big_a)),
            pad(&hex_of(&big_b))
        ))?));
        if u.bits() == 0 {
            return Err(Error::ZeroScrambler);
        }

        let identity = hex::encode(Sha256::digest(
            format!("{}{}:{}", pool_name, user_id, password).as_bytes(),
        ));
        let x = BigUint::from_bytes_be(&Sha256::digest(hex::decode(format!(
            "{}{}",
            pad(salt),
            identity
        ))?));

        // (B - k * g^x) mod N, kept non-negative
        let kgx = (&self.k * self.g.modpow(&x, &self.n)) % &self.n;
        let base = (&big_b % &self.n + &self.n - kgx) % &self.n;
        let s = base.modpow(&(&self.a + &u * &x), &self.n);

        let key = hkdf(
            &hex::decode(pad(&hex_of(&s)))?,
            &hex::decode(pad(&hex_of(&u)))?,
        )?;

        let mut mac = HmacSha256::new_from_slice(&key).map_err(|_| Error::Key)?;
        mac.update(pool_name.as_bytes());
        mac.update(user_id.as_bytes());
        mac.update(&STANDARD.decode(secret_block)?);
        mac.update(timestamp.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl Default for Srp {
    fn default() -> Self {
        Srp::new()
    }
}

/// Cognito wants the day of month without a leading zero.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%a %b %-d %H:%M:%S UTC %Y").to_string()
}

fn hex_of(n: &BigUint) -> String {
    n.to_str_radix(16)
}

// Makes the hex string decode to a positive big-endian integer.
fn pad(hex: &str) -> String {
    if hex.len() % 2 == 1 {
        format!("0{}", hex)
    } else if hex.starts_with(|c: char| "89ABCDEFabcdef".contains(c)) {
        format!("00{}", hex)
    } else {
        hex.to_string()
    }
}

fn hkdf(ikm: &[u8], salt: &[u8]) -> Result<[u8; 16], Error> {
    let mut extract = HmacSha256::new_from_slice(salt).map_err(|_| Error::Key)?;
    extract.update(ikm);
    let prk = extract.finalize().into_bytes();

    let mut expand = HmacSha256::new_from_slice(&prk).map_err(|_| Error::Key)?;
    expand.update(INFO_BITS);
    let okm = expand.finalize().into_bytes();

    let mut key = [0u8; 16];
    key.copy_from_slice(&okm[..16]);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SRP_A: &str = concat!(
        "11f2094ca8eeabefde9223dcfa97175f58336dd2820f428f7fb189bdaedb11ee",
        "72d4cf82ced6c24d7d29d5919358a1d1224f5b086155d26337b76be19017f4e0",
        "0f81ea7f6a2a14b29e95a2a2729e06b25901f944ae904a545e5a93ebf281f071",
        "4de3f7f10a9b9c4543785594e69666f65179af901b215ba138ed1c09a6f38ddf",
        "b3443bab1268884b3475d4b8261470c9cee75edf3c9c1de4530b6c3758b9662f",
        "23fa1382d4154a6e8897c0c61f3e1b2a764ce0a72b0ee446287146512933755b",
        "4069e3bc834a43edbd5c52ed4afaf27559b1f51432b7437a88cd4820025a1fc2",
        "c2d47da31fa6568cf0d6b5ec6b35361203b8141c5e1ebb6acbe3e09525137c9f",
        "0b76e0fb2e7057ed1b5550e6208f72595725d6bedbb9b892516e8dc16e0da10e",
        "69959227eeeefbc566b3fd93891925e635f9ed7d3ead2a25759776c8e8ae6714",
        "5a9ea4623be9b117352fcf7686142fd7546d1c457598253dd56fa71a92a727f1",
        "b9f7ae6db900bc24f6850c2c5836c6bc4f633dfd687b4673a7bf28f8c9f5fefa",
    );
    const SRP_B: &str = concat!(
        "d0f6f61fb76435d394c07c354e5cf34218ca25b2242d02823831a444a86d9832",
        "dd3360058042e77e1a3c6a32c788abc2c23a3cbc79899254491ceaa9917d32ee",
        "ab099709aea09b6b984bc99cca9ec2e50d664c41b7cca9be9e1bac624afedf08",
        "f6d91bbf3537fd9cb8be52d1f3d4cdcc4f6aaf8e0c4b8790ac4a33a7b8d0eb7f",
        "87c2b9300571dc5e60c1d7d5a48b3d183c3ffdc0bec5eee49fe2cf47391063aa",
        "2938db53c13bd601dcd47a6cced32d2187b31050a7c12ba99a89f0ecd7d40e49",
        "49deae99ef6c47cc19a0afa530b702f03654ba2a62bda7ce165278ef599db234",
        "b7519be8fd3ed2f2dec633fb8e7b77f6a7cff2ab05d8dbaaace562537b3890ac",
        "fe37be35dd88fe2fac26c9476646d38f0be503eb0e656d68ef5c988902277486",
        "c2c61018df1bce3ac06086d12227e26d0f60dc2eed0221ddea975f0b5cd4902b",
        "301a404641b6f881eeab94e4b6ff0e1c5452577c9eb8c88ad6128ef435d9e75b",
        "c17d4169d45c3a2f8f627b5126dc5d8bc149dffbfa90353d7c9e69c9d7893be",
    );
    fn fixed_srp() -> Srp {
        let a = BigUint::parse_bytes("7d3a".repeat(32).as_bytes(), 16).unwrap();
        Srp::with_secret(a)
    }

    #[test]
    fn pad_sign_and_parity() {
        assert_eq!(pad("abc"), "0abc");
        assert_eq!(pad("7f"), "7f");
        assert_eq!(pad("80"), "0080");
        assert_eq!(pad("F1"), "00F1");
    }

    #[test]
    fn multiplier_matches_cognito() {
        let srp = fixed_srp();
        assert_eq!(
            hex_of(&srp.k),
            "538282c4354742d7cbbde2359fcf67f9f5b3a6b08791e5011b43b8a5b66d9ee6"
        );
    }

    #[test]
    fn public_key_from_fixed_secret() {
        assert_eq!(fixed_srp().srp_a(), SRP_A);
    }

    #[test]
    fn random_public_keys_differ() {
        assert_ne!(Srp::new().srp_a(), Srp::new().srp_a());
    }

    #[test]
    fn password_claim_signature() {
        let sig = fixed_srp()
            .password_claim(
                "6B3uo6uKN",
                "d8f1c2a0-5b6e-4f0e-9a51-0123456789ab",
                "hunter2",
                "9f3c1a2b4d5e6f708192a3b4c5d6e7f8",
                SRP_B,
                "b3BhcXVlIHNlY3JldCBibG9jayBmcm9tIGNvZ25pdG8=",
                "Tue Mar 5 09:07:03 UTC 2024",
            )
            .unwrap();
        assert_eq!(sig, "HC5UYoV8UI1QNhQY+d2vsQWuScZkh4Z5iB5f2nQMI/w=");
    }

    #[test]
    fn rejects_zero_server_key() {
        let err = fixed_srp()
            .password_claim("p", "u", "pw", "00", "0", "", "t")
            .unwrap_err();
        assert!(matches!(err, Error::UnsafeServerKey));
    }

    #[test]
    fn rejects_garbage_server_key() {
        let err = fixed_srp()
            .password_claim("p", "u", "pw", "00", "not hex", "", "t")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter("SRP_B")));
    }

    #[test]
    fn rejects_bad_secret_block() {
        let err = fixed_srp()
            .password_claim("p", "u", "pw", "00", SRP_B, "***", "t")
            .unwrap_err();
        assert!(matches!(err, Error::SecretBlock(_)));
    }

    #[test]
    fn timestamp_drops_leading_zero_of_day() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 3).unwrap();
        assert_eq!(timestamp(t), "Tue Mar 5 09:07:03 UTC 2024");
        let t = Utc.with_ymd_and_hms(2024, 11, 21, 23, 0, 59).unwrap();
        assert_eq!(timestamp(t), "Thu Nov 21 23:00:59 UTC 2024");
    }
}
