//! Per-record-type payload field tables
//!
//! One static, ordered field table per SIMO record type drives the generic
//! mapper in [`super::mapper`]. Types 001/004/011 share the
//! individual-customer + account shape; 002/003/012 share the compact
//! account-status shape. Tables differ only in which fields are present,
//! their max lengths, and whether the suspicion flag defaults.

use simobridge_domain::RecordType;

/// Target field name of the registered service phone number.
pub const PHONE_FIELD: &str = "SoDienThoaiDangKyDichVu";

/// Declared semantic type of a payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str { max_len: Option<usize> },
    Int,
    Date,
}

/// Identifier repair applied to a string field after coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldNorm {
    None,
    /// Vietnamese 10-digit mobile standard.
    Phone,
    /// Legacy 9-digit / new 12-digit national ID padding.
    NationalId,
    /// Separator stripping only (CIF, account numbers).
    Digits,
}

/// One declared payload field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Case-sensitive source keys, tried in order; first present key wins.
    ///
    /// The upstream extracts disagree on casing for a few fields (`Soid` vs
    /// `SoID`, `LoaiD` vs `LoaiID`, and a `ThietBiDong` misspelling of
    /// `ThietBiDiDong`). Both spellings are kept as explicit aliases until
    /// the feeds are unified; do not collapse them here.
    pub source_keys: &'static [&'static str],
    /// Target field name in the payload.
    pub name: &'static str,
    pub kind: FieldKind,
    pub norm: FieldNorm,
    /// Integer substituted when the source key is present but the value is
    /// empty or unparseable. Only the suspicion flag uses this.
    pub empty_default: Option<i64>,
}

const fn field(
    source_keys: &'static [&'static str],
    name: &'static str,
    kind: FieldKind,
    norm: FieldNorm,
) -> FieldSpec {
    FieldSpec { source_keys, name, kind, norm, empty_default: None }
}

/// Individual-customer + account shape, shared by SIMO 001 and 011.
const INDIVIDUAL_FIELDS: [FieldSpec; 18] = [
    field(&["Cif"], "Cif", FieldKind::Str { max_len: Some(36) }, FieldNorm::Digits),
    field(&["SoID", "Soid"], "SoID", FieldKind::Str { max_len: Some(15) }, FieldNorm::NationalId),
    field(&["LoaiID", "LoaiD"], "LoaiID", FieldKind::Int, FieldNorm::None),
    field(&["TenKhachHang"], "TenKhachHang", FieldKind::Str { max_len: Some(150) }, FieldNorm::None),
    field(&["NgaySinh"], "NgaySinh", FieldKind::Date, FieldNorm::None),
    field(&["GioiTinh"], "GioiTinh", FieldKind::Int, FieldNorm::None),
    field(&["MaSoThue"], "MaSoThue", FieldKind::Str { max_len: None }, FieldNorm::None),
    field(&[PHONE_FIELD], PHONE_FIELD, FieldKind::Str { max_len: Some(15) }, FieldNorm::Phone),
    field(&["DiaChi"], "DiaChi", FieldKind::Str { max_len: Some(300) }, FieldNorm::None),
    field(
        &["DiaChiKiemSoatTruyCap"],
        "DiaChiKiemSoatTruyCap",
        FieldKind::Str { max_len: Some(60) },
        FieldNorm::None,
    ),
    field(
        &["MaSoNhanDangThietBiDiDong", "MaSoNhanDangThietBiDong"],
        "MaSoNhanDangThietBiDiDong",
        FieldKind::Str { max_len: Some(36) },
        FieldNorm::None,
    ),
    field(&["SoTaiKhoan"], "SoTaiKhoan", FieldKind::Str { max_len: None }, FieldNorm::Digits),
    field(&["LoaiTaiKhoan"], "LoaiTaiKhoan", FieldKind::Int, FieldNorm::None),
    field(
        &["TrangThaiHoatDongTaiKhoan"],
        "TrangThaiHoatDongTaiKhoan",
        FieldKind::Int,
        FieldNorm::None,
    ),
    field(&["NgayMoTaiKhoan"], "NgayMoTaiKhoan", FieldKind::Date, FieldNorm::None),
    field(&["PhuongThucMoTaiKhoan"], "PhuongThucMoTaiKhoan", FieldKind::Int, FieldNorm::None),
    field(&["NgayXacThucTaiQuay"], "NgayXacThucTaiQuay", FieldKind::Date, FieldNorm::None),
    field(&["QuocTich"], "QuocTich", FieldKind::Str { max_len: Some(36) }, FieldNorm::None),
];

/// SIMO 004: the individual shape plus a free-text note.
const INDIVIDUAL_FIELDS_WITH_NOTE: [FieldSpec; 19] = [
    INDIVIDUAL_FIELDS[0],
    INDIVIDUAL_FIELDS[1],
    INDIVIDUAL_FIELDS[2],
    INDIVIDUAL_FIELDS[3],
    INDIVIDUAL_FIELDS[4],
    INDIVIDUAL_FIELDS[5],
    INDIVIDUAL_FIELDS[6],
    INDIVIDUAL_FIELDS[7],
    INDIVIDUAL_FIELDS[8],
    INDIVIDUAL_FIELDS[9],
    INDIVIDUAL_FIELDS[10],
    INDIVIDUAL_FIELDS[11],
    INDIVIDUAL_FIELDS[12],
    INDIVIDUAL_FIELDS[13],
    INDIVIDUAL_FIELDS[14],
    INDIVIDUAL_FIELDS[15],
    INDIVIDUAL_FIELDS[16],
    field(&["GhiChu"], "GhiChu", FieldKind::Str { max_len: Some(500) }, FieldNorm::None),
    INDIVIDUAL_FIELDS[17],
];

/// Compact account-status shape with a defaulting suspicion flag (002/003).
const ACCOUNT_STATUS_FIELDS: [FieldSpec; 6] = [
    field(&["Cif"], "Cif", FieldKind::Str { max_len: Some(36) }, FieldNorm::Digits),
    field(&["SoTaiKhoan"], "SoTaiKhoan", FieldKind::Str { max_len: None }, FieldNorm::Digits),
    field(&["TenKhachHang"], "TenKhachHang", FieldKind::Str { max_len: Some(150) }, FieldNorm::None),
    field(
        &["TrangThaiHoatDongTaiKhoan"],
        "TrangThaiHoatDongTaiKhoan",
        FieldKind::Int,
        FieldNorm::None,
    ),
    FieldSpec {
        source_keys: &["NghiNgo"],
        name: "NghiNgo",
        kind: FieldKind::Int,
        norm: FieldNorm::None,
        empty_default: Some(0),
    },
    field(&["GhiChu"], "GhiChu", FieldKind::Str { max_len: Some(500) }, FieldNorm::None),
];

/// Compact account-status shape without the suspicion default (012).
const ACCOUNT_STATUS_FIELDS_PLAIN: [FieldSpec; 6] = [
    ACCOUNT_STATUS_FIELDS[0],
    ACCOUNT_STATUS_FIELDS[1],
    ACCOUNT_STATUS_FIELDS[2],
    ACCOUNT_STATUS_FIELDS[3],
    field(&["NghiNgo"], "NghiNgo", FieldKind::Int, FieldNorm::None),
    ACCOUNT_STATUS_FIELDS[5],
];

/// The declared field table for a record type.
pub fn field_table(record_type: RecordType) -> &'static [FieldSpec] {
    match record_type {
        RecordType::Simo001 | RecordType::Simo011 => &INDIVIDUAL_FIELDS,
        RecordType::Simo004 => &INDIVIDUAL_FIELDS_WITH_NOTE,
        RecordType::Simo002 | RecordType::Simo003 => &ACCOUNT_STATUS_FIELDS,
        RecordType::Simo012 => &ACCOUNT_STATUS_FIELDS_PLAIN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn individual_shapes_have_expected_arity() {
        assert_eq!(field_table(RecordType::Simo001).len(), 18);
        assert_eq!(field_table(RecordType::Simo011).len(), 18);
        assert_eq!(field_table(RecordType::Simo004).len(), 19);
    }

    #[test]
    fn compact_shapes_have_six_fields() {
        for rt in [RecordType::Simo002, RecordType::Simo003, RecordType::Simo012] {
            assert_eq!(field_table(rt).len(), 6);
        }
    }

    #[test]
    fn suspicion_flag_defaults_only_on_002_and_003() {
        for rt in [RecordType::Simo002, RecordType::Simo003] {
            let spec = field_table(rt).iter().find(|f| f.name == "NghiNgo").unwrap();
            assert_eq!(spec.empty_default, Some(0));
        }

        let spec =
            field_table(RecordType::Simo012).iter().find(|f| f.name == "NghiNgo").unwrap();
        assert_eq!(spec.empty_default, None);
    }

    #[test]
    fn dual_cased_source_aliases_are_preserved() {
        let table = field_table(RecordType::Simo001);

        let so_id = table.iter().find(|f| f.name == "SoID").unwrap();
        assert_eq!(so_id.source_keys, &["SoID", "Soid"][..]);

        let loai_id = table.iter().find(|f| f.name == "LoaiID").unwrap();
        assert_eq!(loai_id.source_keys, &["LoaiID", "LoaiD"][..]);
    }

    #[test]
    fn phone_field_always_carries_phone_normalizer() {
        for rt in [RecordType::Simo001, RecordType::Simo004, RecordType::Simo011] {
            let spec = field_table(rt).iter().find(|f| f.name == PHONE_FIELD).unwrap();
            assert_eq!(spec.norm, FieldNorm::Phone);
        }
    }

    #[test]
    fn note_field_sits_before_nationality_on_004() {
        let table = field_table(RecordType::Simo004);
        let ghi_chu = table.iter().position(|f| f.name == "GhiChu").unwrap();
        let quoc_tich = table.iter().position(|f| f.name == "QuocTich").unwrap();
        assert!(ghi_chu < quoc_tich);
    }
}
