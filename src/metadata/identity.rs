//! Assembly identities and their .NET display names.
//!
//! The assembly-qualified name of a type ends in the display name of the assembly defining
//! it, e.g. `mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089`.
//! [`crate::metadata::identity::AssemblyIdentity`] holds the four components and formats
//! or parses that string.

use std::fmt;

use crate::Result;

/// A four part assembly version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssemblyVersion {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
    /// Build number
    pub build: u16,
    /// Revision number
    pub revision: u16,
}

impl AssemblyVersion {
    /// Create a version from its four components.
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        AssemblyVersion {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parse `major[.minor[.build[.revision]]]`, missing parts default to zero.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for more than four parts or non numeric parts.
    pub fn parse(version: &str) -> Result<Self> {
        let parts: Vec<&str> = version.split('.').collect();
        if parts.len() > 4 {
            return Err(malformed_error!("Invalid version format: {}", version));
        }

        let mut components = [0u16; 4];
        for (component, part) in components.iter_mut().zip(&parts) {
            *component = part
                .trim()
                .parse::<u16>()
                .map_err(|_| malformed_error!("Invalid version component: {}", part))?;
        }

        Ok(Self::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Name, version, culture and public key token of an assembly.
///
/// # Examples
///
/// ```rust
/// use dotsig::metadata::identity::AssemblyIdentity;
///
/// let identity = AssemblyIdentity::parse(
///     "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089",
/// )?;
/// assert_eq!(identity.name, "mscorlib");
/// assert_eq!(identity.culture, None);
/// assert_eq!(
///     identity.display_name(),
///     "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089"
/// );
/// # Ok::<(), dotsig::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AssemblyIdentity {
    /// Simple assembly name
    pub name: String,
    /// Assembly version
    pub version: AssemblyVersion,
    /// Culture, `None` for the invariant (`neutral`) culture
    pub culture: Option<String>,
    /// Eight byte public key token, `None` for unsigned assemblies
    pub public_key_token: Option<[u8; 8]>,
}

impl AssemblyIdentity {
    /// Create an identity with neutral culture and no public key token.
    pub fn new(name: impl Into<String>, version: AssemblyVersion) -> Self {
        AssemblyIdentity {
            name: name.into(),
            version,
            culture: None,
            public_key_token: None,
        }
    }

    /// Set the public key token.
    #[must_use]
    pub fn with_public_key_token(mut self, token: [u8; 8]) -> Self {
        self.public_key_token = Some(token);
        self
    }

    /// Set the culture. `"neutral"` and the empty string clear it.
    #[must_use]
    pub fn with_culture(mut self, culture: &str) -> Self {
        self.culture = match culture {
            "" | "neutral" => None,
            other => Some(other.to_string()),
        };
        self
    }

    /// The .NET display name: `Name, Version=a.b.c.d, Culture=x, PublicKeyToken=y`.
    ///
    /// Missing culture renders as `neutral`, a missing token as `null`.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.to_string()
    }

    /// Parse a display name. Only the simple name is mandatory, unknown keys are ignored.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an empty name, a bad version or a public key
    /// token that is not 16 hex digits.
    pub fn parse(display_name: &str) -> Result<Self> {
        let mut parts = display_name.split(',').map(str::trim);

        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(malformed_error!("Assembly name cannot be empty"));
        }

        let mut identity = AssemblyIdentity::new(name, AssemblyVersion::default());
        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };

            match key.trim() {
                "Version" => identity.version = AssemblyVersion::parse(value.trim())?,
                "Culture" => identity = identity.with_culture(value.trim()),
                "PublicKeyToken" => identity.public_key_token = parse_token(value.trim())?,
                _ => {}
            }
        }

        Ok(identity)
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, Version={}, Culture={}, PublicKeyToken=",
            self.name,
            self.version,
            self.culture.as_deref().unwrap_or("neutral")
        )?;

        match &self.public_key_token {
            Some(token) => token.iter().try_for_each(|byte| write!(f, "{byte:02x}")),
            None => f.write_str("null"),
        }
    }
}

fn parse_token(value: &str) -> Result<Option<[u8; 8]>> {
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        return Ok(None);
    }

    if value.len() != 16 || !value.is_ascii() {
        return Err(malformed_error!(
            "PublicKeyToken must be 16 hex characters - {}",
            value
        ));
    }

    let mut token = [0u8; 8];
    for (index, byte) in token.iter_mut().enumerate() {
        let pair = &value[index * 2..index * 2 + 2];
        *byte = u8::from_str_radix(pair, 16)
            .map_err(|_| malformed_error!("Invalid hex in PublicKeyToken - {}", value))?;
    }

    Ok(Some(token))
}
