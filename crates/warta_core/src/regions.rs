//! Indonesian provinces keyed by their BPS province code.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Province {
    pub id: u8,
    pub region: &'static str,
}

const fn province(id: u8, region: &'static str) -> Province {
    Province { id, region }
}

static PROVINCES: [Province; 38] = [
    province(11, "Aceh"),
    province(12, "Sumatera Utara"),
    province(13, "Sumatera Barat"),
    province(14, "Riau"),
    province(15, "Jambi"),
    province(16, "Sumatera Selatan"),
    province(17, "Bengkulu"),
    province(18, "Lampung"),
    province(19, "Kepulauan Bangka Belitung"),
    province(21, "Kepulauan Riau"),
    province(31, "Jakarta"),
    province(32, "Jawa Barat"),
    province(33, "Jawa Tengah"),
    province(34, "DI Yogyakarta"),
    province(35, "Jawa Timur"),
    province(36, "Banten"),
    province(51, "Bali"),
    province(52, "Nusa Tenggara Barat"),
    province(53, "Nusa Tenggara Timur"),
    province(61, "Kalimantan Barat"),
    province(62, "Kalimantan Tengah"),
    province(63, "Kalimantan Selatan"),
    province(64, "Kalimantan Timur"),
    province(65, "Kalimantan Utara"),
    province(71, "Sulawesi Utara"),
    province(72, "Sulawesi Tengah"),
    province(73, "Sulawesi Selatan"),
    province(74, "Sulawesi Tenggara"),
    province(75, "Gorontalo"),
    province(76, "Sulawesi Barat"),
    province(81, "Maluku"),
    province(82, "Maluku Utara"),
    province(91, "Papua Barat"),
    province(92, "Papua"),
    province(93, "Papua Selatan"),
    province(94, "Papua Tengah"),
    province(95, "Papua Pegunungan"),
    province(96, "Papua Barat Daya"),
];

/// All provinces, ordered by code.
pub fn provinces() -> &'static [Province] {
    &PROVINCES
}
