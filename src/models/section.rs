//! Landing page sections
//!
//! Every editable part of the landing page maps to one backend document. The
//! dashboard does not know the document schemas; it only needs to know where
//! each section is fetched from, where updates go, and whether it accepts
//! image uploads.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Editable landing page section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    Beranda,
    Demografi,
    PetaWilayah,
    VisiMisi,
    BatasWilayah,
    Pemerintahan,
    Potensi,
    Sejarah,
    Wisata,
    SaranaPrasarana,
    Galeri,
}

/// Image upload endpoint of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageUpload {
    /// Backend path, relative to the API base URL
    pub path: &'static str,
    /// Form field the backend expects for the title of the item the image belongs to
    pub title_field: Option<&'static str>,
}

impl Section {
    /// All sections in sidebar order
    pub const ALL: [Section; 11] = [
        Section::Beranda,
        Section::Demografi,
        Section::PetaWilayah,
        Section::VisiMisi,
        Section::BatasWilayah,
        Section::Pemerintahan,
        Section::Potensi,
        Section::Sejarah,
        Section::Wisata,
        Section::SaranaPrasarana,
        Section::Galeri,
    ];

    /// URL slug used by the dashboard routes
    pub fn slug(&self) -> &'static str {
        match self {
            Section::Beranda => "beranda",
            Section::Demografi => "demografi",
            Section::PetaWilayah => "peta-wilayah",
            Section::VisiMisi => "visi-misi",
            Section::BatasWilayah => "batas-wilayah",
            Section::Pemerintahan => "pemerintahan",
            Section::Potensi => "potensi",
            Section::Sejarah => "sejarah",
            Section::Wisata => "wisata",
            Section::SaranaPrasarana => "sarana-prasarana",
            Section::Galeri => "galeri",
        }
    }

    /// Title shown in the sidebar and navbar
    pub fn title(&self) -> &'static str {
        match self {
            Section::Beranda => "Beranda",
            Section::Demografi => "Demografi",
            Section::PetaWilayah => "Peta Wilayah",
            Section::VisiMisi => "Visi & Misi",
            Section::BatasWilayah => "Batas Wilayah",
            Section::Pemerintahan => "Pemerintahan",
            Section::Potensi => "Potensi",
            Section::Sejarah => "Sejarah",
            Section::Wisata => "Wisata",
            Section::SaranaPrasarana => "Sarana & Prasarana",
            Section::Galeri => "Galeri",
        }
    }

    /// Numeric id the backend uses for this section
    pub fn id(&self) -> u8 {
        match self {
            Section::Beranda => 1,
            Section::Demografi => 2,
            Section::PetaWilayah => 3,
            Section::VisiMisi => 4,
            Section::BatasWilayah => 5,
            Section::Pemerintahan => 6,
            Section::Potensi => 7,
            Section::Sejarah => 8,
            Section::Wisata => 9,
            Section::SaranaPrasarana => 10,
            Section::Galeri => 11,
        }
    }

    /// Backend path serving the section document
    pub fn fetch_path(&self) -> &'static str {
        match self {
            Section::Beranda => "getBerandaContents",
            Section::Demografi => "getDemografiContents",
            Section::PetaWilayah => "getPetaWilayahContents",
            Section::VisiMisi => "getVisiMisiContents",
            Section::BatasWilayah => "getBatasWilayahContents",
            Section::Pemerintahan => "getPemerintahanContents",
            Section::Potensi => "getPotensiContents",
            Section::Sejarah => "getSejarahContents",
            Section::Wisata => "getWisataContents",
            Section::SaranaPrasarana => "getSaranaPrasaranaContents",
            Section::Galeri => "getGalleryContents",
        }
    }

    /// Backend path accepting section updates
    pub fn update_path(&self) -> String {
        format!("updateSection/{}", self.id())
    }

    /// Image upload endpoint, if the section has images
    pub fn image_upload(&self) -> Option<ImageUpload> {
        let (path, title_field) = match self {
            Section::Beranda => ("uploadHeroImageSection/1", None),
            Section::PetaWilayah => ("uploadHeroImageSection/3", None),
            Section::Pemerintahan => ("uploadHeroImageSection/6", None),
            Section::Wisata => ("uploadImageWisataSection/9", Some("wisataTitle")),
            Section::SaranaPrasarana => (
                "uploadImageSaranaPrasaranaSection/10",
                Some("saranaPrasaranaTitle"),
            ),
            Section::Galeri => ("uploadGalleryImageSection/11", None),
            _ => return None,
        };
        Some(ImageUpload { path, title_field })
    }

    /// Prefix shared by every cached copy of the section document
    pub fn cache_prefix(&self) -> String {
        format!("section:{}:", self.slug())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

/// Error returned for an unknown section slug
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown section: {0}")]
pub struct UnknownSection(pub String);

impl FromStr for Section {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .iter()
            .copied()
            .find(|section| section.slug() == s)
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}
