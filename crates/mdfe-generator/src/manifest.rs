//! Manifest → INI mapping
//!
//! Section order and key names are fixed by the authority's grammar and
//! must not be reordered.

use crate::error::{GenerateError, Result};
use crate::format::{date, non_blank, plate, timestamp, IniBuilder, SectionBuf};
use mdfe_core::document::digits_only;
use mdfe_core::manifest::{DocumentKind, ManifestAggregate, Payment, TollVouchers};
use mdfe_core::uf::uf_code_or_default;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Layout version written to `[MDFE] versao`
pub const LAYOUT_VERSION: &str = "3.00";
/// Document model (`mod`)
pub const MODEL: u8 = 58;

const CHECK_CODE_RANGE: std::ops::RangeInclusive<u32> = 10_000_000..=99_999_999;

/// Deterministic manifest-to-INI mapper.
///
/// The only non-deterministic input is the filler used for a missing
/// `cMDF`; seed it with [`ManifestGenerator::with_seed`] for stable output.
#[derive(Debug)]
pub struct ManifestGenerator {
    rng: Mutex<StdRng>,
    app_version: String,
}

impl Default for ManifestGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestGenerator {
    /// Generator with an OS-seeded filler source
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Generator with a fixed seed
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Generator over a caller-supplied rng
    #[must_use]
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            app_version: crate::VERSION.to_string(),
        }
    }

    /// Override `verProc`
    #[must_use]
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    /// Map a manifest to INI text
    pub fn generate(&self, manifest: &ManifestAggregate) -> Result<String> {
        let mut ini = IniBuilder::default();

        let mut root = SectionBuf::new("MDFE");
        root.put("versao", LAYOUT_VERSION);
        ini.push(root);

        ini.push(self.identification(manifest)?);
        ini.push(emitter(manifest)?);
        ini.push(road(manifest));
        ini.push(vehicle(manifest));
        conductors(manifest, &mut ini);
        trailers(manifest, &mut ini);
        seals(manifest, &mut ini);
        route(manifest, &mut ini);
        municipalities(manifest, &mut ini);
        documents(manifest, &mut ini);
        ini.push(totals(manifest));
        insurance(manifest, &mut ini);
        for (index, payment) in manifest.payments.iter().enumerate() {
            payment_sections(index + 1, payment, &mut ini)?;
        }
        toll_vouchers(manifest, &mut ini);
        additional_info(manifest, &mut ini);
        xml_authorizations(manifest, &mut ini)?;
        technical_responsible(manifest, &mut ini);

        tracing::debug!(
            manifest_id = %manifest.id,
            sections = ini.len(),
            "manifest ini generated"
        );
        Ok(ini.finish())
    }

    fn check_code(&self, manifest: &ManifestAggregate) -> String {
        match non_blank(manifest.identification.check_code.as_deref()) {
            Some(code) => code.to_string(),
            None => self.rng.lock().random_range(CHECK_CODE_RANGE).to_string(),
        }
    }

    fn identification(&self, manifest: &ManifestAggregate) -> Result<SectionBuf> {
        let ide = &manifest.identification;
        let loading = manifest
            .loading
            .first()
            .ok_or_else(|| GenerateError::missing("infMunCarrega"))?;
        let unloading = manifest
            .unloading
            .first()
            .ok_or_else(|| GenerateError::missing("infMunDescarrega"))?;

        let mut s = SectionBuf::new("IDE");
        s.put("cUF", uf_code_or_default(&manifest.emitter.uf))
            .put("tpAmb", ide.environment.tp_amb())
            .put("tpEmit", ide.emitter_type);
        if let Some(kind) = ide.transporter_type {
            s.put("tpTransp", kind);
        }
        s.put("mod", MODEL)
            .put("serie", ide.series)
            .put("nMDF", ide.number)
            .put("cMDF", self.check_code(manifest))
            .put("cDV", non_blank(ide.check_digit.as_deref()).unwrap_or("0"))
            .put("modal", ide.modal)
            .put("dhEmi", timestamp(&ide.emitted_at))
            .put("tpEmis", 1)
            .put("procEmi", 0)
            .put("verProc", &self.app_version)
            .put("UFIni", ide.uf_start.trim())
            .put("UFFim", ide.uf_end.trim())
            .put("cMunCarrega", loading.code)
            .put("xMunCarrega", &loading.name)
            .put("cMunDescarrega", unloading.code)
            .put("xMunDescarrega", &unloading.name);
        if let Some(start) = &ide.trip_start {
            s.put("dhIniViagem", timestamp(start));
        }
        Ok(s)
    }
}

fn emitter(manifest: &ManifestAggregate) -> Result<SectionBuf> {
    let emit = &manifest.emitter;
    let mut s = SectionBuf::new("EMIT");

    if let Some(cnpj) = non_blank(emit.cnpj.as_deref()) {
        s.put("CNPJ", digits_only(cnpj));
    } else if let Some(cpf) = non_blank(emit.cpf.as_deref()) {
        s.put("CPF", digits_only(cpf));
    } else {
        return Err(GenerateError::missing("emit.CNPJ"));
    }

    s.put("IE", emit.ie.as_deref().unwrap_or_default().trim())
        .put("xNome", emit.name.trim())
        .put_opt("xFant", emit.trade_name.as_deref())
        .put("xLgr", emit.street.trim())
        .put("nro", non_blank(emit.number.as_deref()).unwrap_or("S/N"))
        .put_opt("xCpl", emit.complement.as_deref())
        .put("xBairro", emit.district.trim())
        .put("cMun", emit.municipality_code)
        .put("xMun", emit.municipality.trim())
        .put("CEP", digits_only(&emit.cep))
        .put("UF", emit.uf.trim());
    Ok(s)
}

fn road(manifest: &ManifestAggregate) -> SectionBuf {
    let mut s = SectionBuf::new("RODO");
    s.put_opt("RNTRC", manifest.road.rntrc.as_deref())
        .put_opt("CIOT", manifest.road.ciot.as_deref());
    s
}

fn vehicle(manifest: &ManifestAggregate) -> SectionBuf {
    let v = &manifest.vehicle;
    let mut s = SectionBuf::new("VEICTRACAO");
    s.put("cInt", "").put("placa", plate(&v.plate));
    if let Some(tare) = v.tare_kg {
        s.put("tara", tare);
    }
    s.put("capKG", "").put("capM3", "");

    if let Some(owner) = v.owner.as_ref().filter(|o| o.differs_from(&manifest.emitter)) {
        s.put("tpProp", 2).put("tpVinc", 0);
        if let Some(cpf) = non_blank(owner.cpf.as_deref()) {
            s.put("CPF", digits_only(cpf));
        } else if let Some(cnpj) = non_blank(owner.cnpj.as_deref()) {
            s.put("CNPJ", digits_only(cnpj));
        }
        s.put("RNTRC", owner.rntrc.as_deref().unwrap_or_default())
            .put("xNome", owner.name.as_deref().unwrap_or_default())
            .put_opt("IE", owner.ie.as_deref())
            .put_opt("UF", owner.uf.as_deref());
    }

    s.put("tpRod", v.wheel_type.trim())
        .put("tpCar", v.body_type.trim())
        .put("UF", v.uf.trim());
    s
}

fn conductors(manifest: &ManifestAggregate, ini: &mut IniBuilder) {
    for (index, conductor) in manifest.conductors().enumerate() {
        let mut s = SectionBuf::new(format!("CONDUTOR{:02}", index + 1));
        s.put("xNome", conductor.name.trim())
            .put("CPF", digits_only(&conductor.cpf));
        ini.push(s);
    }
}

fn trailers(manifest: &ManifestAggregate, ini: &mut IniBuilder) {
    for (index, trailer) in manifest.trailers.iter().enumerate() {
        let mut s = SectionBuf::new(format!("REBOQUE{:02}", index + 1));
        s.put("cInt", "").put("placa", plate(&trailer.plate));
        if trailer.tare_kg > 0 {
            s.put("tara", trailer.tare_kg);
        }
        s.put("capKG", "")
            .put("capM3", "")
            .put("tpCar", trailer.body_type.as_deref().unwrap_or_default())
            .put("UF", trailer.uf.as_deref().unwrap_or_default());
        ini.push(s);
    }
}

fn seals(manifest: &ManifestAggregate, ini: &mut IniBuilder) {
    if manifest.seals.is_empty() {
        return;
    }
    ini.header("LACRODOVIA");
    for (index, seal) in manifest.seals.iter().enumerate() {
        let mut s = SectionBuf::new(format!("LACROD{:02}", index + 1));
        s.put("nLacre", seal.trim());
        ini.push(s);
    }
}

fn route(manifest: &ManifestAggregate, ini: &mut IniBuilder) {
    if manifest.route_ufs.is_empty() {
        return;
    }
    ini.header("INFPERCURSO");
    for (index, uf) in manifest.route_ufs.iter().enumerate() {
        let mut s = SectionBuf::new(format!("UFPER{:02}", index + 1));
        s.put("UFPer", uf.trim());
        ini.push(s);
    }
}

fn municipalities(manifest: &ManifestAggregate, ini: &mut IniBuilder) {
    ini.header("INFMUNCARREGA");
    for (index, m) in manifest.loading.iter().enumerate() {
        let mut s = SectionBuf::new(format!("MUNCARREGA{:02}", index + 1));
        s.put("cMunCarrega", m.code).put("xMunCarrega", m.name.trim());
        ini.push(s);
    }

    ini.header("INFMUNDESCARREGA");
    for (index, m) in manifest.unloading.iter().enumerate() {
        let mut s = SectionBuf::new(format!("MUNDESCARREGA{:02}", index + 1));
        s.put("cMunDescarrega", m.code)
            .put("xMunDescarrega", m.name.trim());
        ini.push(s);
    }
}

fn documents(manifest: &ManifestAggregate, ini: &mut IniBuilder) {
    let ordered = manifest
        .documents_of(DocumentKind::Nfe)
        .chain(manifest.documents_of(DocumentKind::Cte));

    for (index, doc) in ordered.enumerate() {
        let prefix = match doc.kind {
            DocumentKind::Nfe => "INFNFE",
            DocumentKind::Cte => "INFCTE",
        };
        let mut s = SectionBuf::new(format!("{prefix}{:03}", index + 1));
        s.put(doc.kind.key_field(), doc.key.trim())
            .put_opt("SegCodBarra", doc.barcode_segment.as_deref())
            .put_opt("indReentrega", doc.redelivery.as_deref());
        ini.push(s);
    }
}

fn totals(manifest: &ManifestAggregate) -> SectionBuf {
    let totals = &manifest.totals;
    let mut s = SectionBuf::new("TOT");
    s.put("qCTe", manifest.documents_of(DocumentKind::Cte).count())
        .put("qNFe", manifest.documents_of(DocumentKind::Nfe).count())
        .put("qMDFe", totals.transported_manifests)
        .put("vCarga", totals.value)
        .put("cUnid", totals.unit.trim())
        .put("qCarga", totals.gross_weight);
    s
}

fn insurance(manifest: &ManifestAggregate, ini: &mut IniBuilder) {
    let Some(seg) = &manifest.insurance else {
        return;
    };
    let Some(insurer) = non_blank(seg.insurer_cnpj.as_deref()) else {
        return;
    };

    let mut s = SectionBuf::new("SEG");
    s.put("infResp", non_blank(seg.responsible.as_deref()).unwrap_or("1"))
        .put("infSeg", 2)
        .put("CNPJ", digits_only(insurer))
        .put_opt("nApol", seg.policy_number.as_deref());
    ini.push(s);

    if let Some(endorsement) = non_blank(seg.endorsement.as_deref()) {
        let mut s = SectionBuf::new("AVERB01");
        s.put("nAver", endorsement);
        ini.push(s);
    }
}

fn payment_sections(index: usize, payment: &Payment, ini: &mut IniBuilder) -> Result<()> {
    let mut s = SectionBuf::new(format!("INFPAG{index:02}"));
    s.put("xNome", payment.name.as_deref().unwrap_or_default().trim());
    if let Some(document) = non_blank(payment.document.as_deref()) {
        let digits = digits_only(document);
        let key = if digits.len() == 14 { "CNPJ" } else { "CPF" };
        s.put(key, digits);
    }
    if let Some(value) = payment.contract_value {
        s.put("vContrato", value);
    }
    s.put("indPag", payment.indicator);
    ini.push(s);

    for (n, comp) in payment.components.iter().enumerate() {
        let mut s = SectionBuf::new(format!("COMP{:03}", n + 1));
        s.put("tpComp", comp.kind.trim())
            .put("vComp", comp.value)
            .put_opt("xComp", comp.description.as_deref());
        ini.push(s);
    }

    for (n, installment) in payment.installments.iter().enumerate() {
        let mut s = SectionBuf::new(format!("INFPRAZO{:03}", n + 1));
        s.put("nParcela", format!("{:03}", installment.number))
            .put("dVenc", date(&installment.due))
            .put("vParcela", installment.value);
        ini.push(s);
    }

    if let Some(bank) = &payment.bank {
        let mut s = SectionBuf::new(format!("INFBANC{index:02}"));
        if let Some(code) = non_blank(bank.bank_code.as_deref()) {
            let agency = non_blank(bank.agency.as_deref())
                .ok_or_else(|| GenerateError::missing("infBanc.codAgencia"))?;
            s.put("codBanco", code).put("codAgencia", agency);
        } else if let Some(ipef) = non_blank(bank.ipef_cnpj.as_deref()) {
            s.put("CNPJIPEF", digits_only(ipef));
        } else if let Some(pix) = non_blank(bank.pix.as_deref()) {
            s.put("PIX", pix);
        } else {
            return Err(GenerateError::missing("infBanc"));
        }
        ini.push(s);
    }
    Ok(())
}

fn toll_vouchers(manifest: &ManifestAggregate, ini: &mut IniBuilder) {
    match &manifest.toll_vouchers {
        None => {}
        Some(TollVouchers::NoVoucher) => {
            let mut s = SectionBuf::new("VALEPEDAGIO");
            s.put("semValePed", 1);
            ini.push(s);
        }
        Some(TollVouchers::Disbursements { items }) if items.is_empty() => {}
        Some(TollVouchers::Disbursements { items }) => {
            ini.header("VALEPEDAGIO");
            for (index, item) in items.iter().enumerate() {
                let mut s = SectionBuf::new(format!("DISP{:02}", index + 1));
                s.put("CNPJForn", digits_only(&item.supplier_cnpj))
                    .put_opt("CNPJPg", item.payer_cnpj.as_deref())
                    .put("nCompra", item.purchase_number.trim())
                    .put("vValePed", item.value);
                ini.push(s);
            }
        }
    }
}

fn additional_info(manifest: &ManifestAggregate, ini: &mut IniBuilder) {
    if let Some(text) = non_blank(manifest.additional_info.as_deref()) {
        let mut s = SectionBuf::new("INFADIPOLO");
        s.put("infCpl", text);
        ini.push(s);
    }
}

fn xml_authorizations(manifest: &ManifestAggregate, ini: &mut IniBuilder) -> Result<()> {
    if manifest.xml_authorizations.is_empty() {
        return Ok(());
    }
    ini.header("AUTXML");
    for (index, id) in manifest.xml_authorizations.iter().enumerate() {
        let digits = digits_only(id);
        let key = match digits.len() {
            14 => "CNPJ",
            11 => "CPF",
            n => {
                return Err(GenerateError::invalid(
                    "autXML",
                    format!("expected 11 or 14 digits, got {n}"),
                ))
            }
        };
        let mut s = SectionBuf::new(format!("AUT{:02}", index + 1));
        s.put(key, digits);
        ini.push(s);
    }
    Ok(())
}

fn technical_responsible(manifest: &ManifestAggregate, ini: &mut IniBuilder) {
    let Some(resp) = &manifest.technical_responsible else {
        return;
    };
    let mut s = SectionBuf::new("INFRESPTEC");
    s.put("CNPJ", digits_only(resp.cnpj.as_deref().unwrap_or_default()))
        .put("xContato", resp.contact.as_deref().unwrap_or_default())
        .put("email", resp.email.as_deref().unwrap_or_default())
        .put("fone", resp.phone.as_deref().unwrap_or_default())
        .put_opt("idCSRT", resp.csrt_id.as_deref())
        .put_opt("hashCSRT", resp.csrt_hash.as_deref());
    ini.push(s);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filler_is_eight_digits_and_seeded() {
        let a = ManifestGenerator::with_seed(7);
        let b = ManifestGenerator::with_seed(7);
        let draw = |g: &ManifestGenerator| g.rng.lock().random_range(CHECK_CODE_RANGE);
        let (x, y) = (draw(&a), draw(&b));
        assert_eq!(x, y);
        assert_eq!(x.to_string().len(), 8);
    }
}
