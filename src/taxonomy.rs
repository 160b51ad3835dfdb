//! Built-in topic taxonomy and result sentinels.
//!
//! Labels and descriptions are two independent ordered lists. Labels drive
//! normalization; descriptions are only interpolated into the prompt, so a
//! description may name a topic that is not in the label list.

/// Result recorded when a row has no feedback text.
pub const NO_FEEDBACK: &str = "Tidak Ada Feedback";
/// Result recorded when the model reply matches no canonical label.
pub const UNCATEGORIZED: &str = "Tidak Terkategorikan";
/// Result recorded when the model call for a row failed.
pub const REQUEST_ERROR: &str = "ERROR";

/// Required input column holding the free-text feedback.
pub const FEEDBACK_COLUMN: &str = "Feedback";
/// Column appended to the output table.
pub const RESULT_COLUMN: &str = "Kategori Feedback";

pub const DEFAULT_LABELS: &[&str] = &[
    "Informasi Produk & Layanan",
    "Package Information",
    "Status dan Proses Pemesanan",
    "Administrasi",
    "Ketersediaan Layanan",
    "General Business Discussion",
    "Others",
    "Price & Promo",
    "Kompetitor",
    "Call Center",
    "Service Complaints",
    "Maintenance",
    "Pelatihan Bisnis",
    "After Sales",
];

pub const DEFAULT_DESCRIPTIONS: &[&str] = &[
    "Informasi Produk & Layanan : Semua pembahasan terkait informasi penggunaan aplikasi dan layanan, atribut (kelebihan, kekurangan, fitur), perbandingan, kisah sukses, rekomendasi, informasi harga produk, package Information, IP Layanan, Perbedaan Paket dan tautan produk serta layanan Telkom Indonesia.",
    "Status dan Proses Pemesanan : Segala pembahasan terkait informasi paket yang tersedia, perbandingan antar paket, permintaan perubahan paket (menaikkan, menurunkan, migrasi), kebijakan penggunaan (FUP), serta pengecekan penggunaan atau sisa paket layanan.",
    "Administrasi : Segala informasi dan proses terkait data pelanggan (ID, nomor, transaksi, pendaftaran), perubahan data (nama, alamat, nomor telepon), perpindahan perangkat, proses verifikasi, serta sinkronisasi akun.",
    "Ketersediaan Layanan : Topik mengenai cakupan area layanan, ketersediaan jaringan (termasuk ODP), dan lokasi kantor atau Plasa Telkom.",
    "General Business Discussion : Topik terkait diskusi bisnis umum, pengembangan bisnis, peluang reseller, serta pelatihan, edukasi, dan webinar yang berhubungan dengan bisnis.",
    "Others : Kategori untuk pertanyaan yang tidak relevan, tidak jelas, di luar cakupan produk/layanan, sapaan, upaya probing informasi, serta pembahasan kompetitor atau misklasifikasi sistem.",
    "Price & Intensif : Segala hal Terkait, promo diskon, serta insentif dan kode referral.",
    "Kompetitor : Informasi terkait perusahaan lain, perbandingan produk dan pelayanan, dan referensi dari kompetitor utk pengembangan produk.",
    "Call Center : Mengacu pada permintaan pelanggan untuk hal hal diluar konteks dan bersifat privacy.",
    "Service Complaints : Segala bentuk keluhan atau masalah yang diajukan oleh pelanggan terkait kualitas atau kinerja layanan yang mereka terima.",
    "Maintenance : Semua kegiatan yang dilakukan untuk menjaga, memperbaiki, atau meningkatkan fungsi dan kualitas suatu sistem atau layanan agar tetap beroperasi dengan optimal.",
    "Pelatihan Bisnis : program atau kegiatan yang dirancang untuk memberikan pengetahuan, keterampilan, atau wawasan yang relevan untuk pengembangan profesional atau operasional dalam konteks bisnis.",
    "After Sales : seluruh bentuk dukungan dan layanan yang diberikan kepada pelanggan setelah mereka melakukan pembelian, bertujuan untuk memastikan kepuasan dan keberlanjutan penggunaan.",
    "Billing : Segala hal terkait tagihan, metode dan status pembayaran.",
];

pub fn default_labels() -> Vec<String> {
    DEFAULT_LABELS.iter().map(|label| label.to_string()).collect()
}

pub fn default_descriptions() -> Vec<String> {
    DEFAULT_DESCRIPTIONS
        .iter()
        .map(|description| description.to_string())
        .collect()
}

/// True for strings reserved as per-row outcomes rather than topics.
pub fn is_sentinel(value: &str) -> bool {
    matches!(value, NO_FEEDBACK | UNCATEGORIZED | REQUEST_ERROR)
}
