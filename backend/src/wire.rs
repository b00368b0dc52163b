//! Flat bracket-indexed wire codec for plans.
//!
//! The persistence layer speaks `application/x-www-form-urlencoded` with
//! bracket-indexed keys, and expects selected fields twice: once flat and
//! once inside a nested `config` namespace whose monetary values carry the
//! full display mask (the flat copies stay canonical). Encoding is a single
//! deterministic pass; decoding prefers the flat fields and falls back to
//! the `config` mirrors, so records written by either generation of the
//! persistence layer hydrate the same way.
//!
//! Key map, flat side:
//! `id`, `id_curso`, `nome`, `valor`, `ativo`, `tipo_curso`, `obs`,
//! `atualizado`, `previsao_turma[]`,
//! `parcelas[<slot>][parcela|tipo_entrada|entrada|juros|valor|desconto]`.
//! Mirrored side: `config[valor]`, `config[tipo_curso]`,
//! `config[previsao_turma][]`, `config[parcelas][<slot>][...]`, and the term
//! entries `config[tx2][<i>][name_label|name_valor]`.

use crate::domain::money::MoneyCodec;
use shared::{ActiveFlag, InstallmentPlan, ParcelOption, TermEntry, DEFAULT_INSTALLMENTS};
use std::collections::BTreeMap;

pub type WirePair = (String, String);

/// Flattens a plan into its wire pairs, flat keys first, `config` mirror
/// second, rows in ascending slot order.
pub fn encode(plan: &InstallmentPlan, codec: &MoneyCodec) -> Vec<WirePair> {
    let mut pairs = Vec::new();

    if let Some(id) = plan.id {
        pairs.push(("id".to_string(), id.to_string()));
    }
    if let Some(course_id) = plan.course_id {
        pairs.push(("id_curso".to_string(), course_id.to_string()));
    }
    pairs.push(("nome".to_string(), plan.name.clone()));
    pairs.push(("valor".to_string(), plan.total_value.clone()));
    pairs.push(("ativo".to_string(), plan.active.as_wire().to_string()));
    pairs.push(("tipo_curso".to_string(), plan.legacy_course_type.clone()));
    pairs.push(("obs".to_string(), plan.note.clone()));
    if let Some(updated_at) = &plan.updated_at {
        pairs.push(("atualizado".to_string(), updated_at.clone()));
    }
    for class_id in &plan.class_scope {
        pairs.push(("previsao_turma[]".to_string(), class_id.to_string()));
    }
    for (slot, option) in &plan.options {
        push_option(&mut pairs, "parcelas", *slot, option, None);
    }

    // nested mirror for the legacy reader, monetary values display-masked
    pairs.push(("config[valor]".to_string(), codec.format(&plan.total_value)));
    pairs.push((
        "config[tipo_curso]".to_string(),
        plan.legacy_course_type.clone(),
    ));
    for class_id in &plan.class_scope {
        pairs.push(("config[previsao_turma][]".to_string(), class_id.to_string()));
    }
    for (slot, option) in &plan.options {
        push_option(&mut pairs, "config[parcelas]", *slot, option, Some(codec));
    }
    for (position, term) in plan.extra_terms.iter().enumerate() {
        pairs.push((
            format!("config[tx2][{position}][name_label]"),
            term.label.clone(),
        ));
        pairs.push((
            format!("config[tx2][{position}][name_valor]"),
            term.text.clone(),
        ));
    }

    pairs
}

fn push_option(
    pairs: &mut Vec<WirePair>,
    prefix: &str,
    slot: u32,
    option: &ParcelOption,
    mask: Option<&MoneyCodec>,
) {
    let key = |field: &str| format!("{prefix}[{slot}][{field}]");
    let value = option.value.clone().unwrap_or_default();
    let value = match mask {
        Some(codec) => codec.format(&value),
        None => value,
    };

    pairs.push((key("parcela"), option.installment_count.to_string()));
    pairs.push((key("tipo_entrada"), option.entry_type.clone()));
    pairs.push((key("entrada"), option.entry_value.clone()));
    pairs.push((key("juros"), option.interest.clone()));
    pairs.push((key("valor"), value));
    pairs.push((key("desconto"), option.discount.clone().unwrap_or_default()));
}

/// Hydrates a plan from its wire pairs.
///
/// Flat fields win; the `config` mirrors are the fallback (their masked
/// monetary values are unmasked on the way in). When neither side yields a
/// row the plan gets the single default row a fresh draft starts with. An
/// empty class scope stays empty: it means "all classes", not "none".
pub fn decode(pairs: &[WirePair], codec: &MoneyCodec) -> InstallmentPlan {
    let mut plan = InstallmentPlan::default();
    let mut flat_options: BTreeMap<u32, ParcelOption> = BTreeMap::new();
    let mut mirror_options: BTreeMap<u32, ParcelOption> = BTreeMap::new();
    let mut flat_scope: Vec<i64> = Vec::new();
    let mut mirror_scope: Vec<i64> = Vec::new();
    let mut mirror_total = String::new();
    let mut mirror_course_type = String::new();
    let mut terms: BTreeMap<usize, TermEntry> = BTreeMap::new();

    for (key, value) in pairs {
        match split_key(key).as_slice() {
            ["id"] => plan.id = value.parse().ok(),
            ["id_curso"] => plan.course_id = value.parse().ok(),
            ["nome"] => plan.name = value.clone(),
            ["valor"] => plan.total_value = codec.remove_mask(value),
            ["ativo"] => plan.active = ActiveFlag::from_wire(value),
            ["tipo_curso"] => plan.legacy_course_type = value.clone(),
            ["obs"] => plan.note = value.clone(),
            ["atualizado"] => {
                plan.updated_at = (!value.is_empty()).then(|| value.clone());
            }
            ["previsao_turma", ""] => {
                if let Ok(class_id) = value.parse() {
                    flat_scope.push(class_id);
                }
            }
            ["parcelas", slot, field] => {
                set_option_field(&mut flat_options, codec, slot, field, value);
            }
            ["config", "valor"] => mirror_total = codec.remove_mask(value),
            ["config", "tipo_curso"] => mirror_course_type = value.clone(),
            ["config", "previsao_turma", ""] => {
                if let Ok(class_id) = value.parse() {
                    mirror_scope.push(class_id);
                }
            }
            ["config", "parcelas", slot, field] => {
                set_option_field(&mut mirror_options, codec, slot, field, value);
            }
            ["config", "tx2", position, field] => {
                set_term_field(&mut terms, position, field, value);
            }
            // unknown keys are the persistence layer's business, not ours
            _ => {}
        }
    }

    plan.options = if flat_options.is_empty() {
        mirror_options
    } else {
        flat_options
    };
    plan.class_scope = if flat_scope.is_empty() {
        mirror_scope
    } else {
        flat_scope
    };
    if plan.total_value.is_empty() {
        plan.total_value = mirror_total;
    }
    if plan.legacy_course_type.is_empty() {
        plan.legacy_course_type = mirror_course_type;
    }
    if plan.options.is_empty() {
        plan.options
            .insert(1, ParcelOption::with_count(DEFAULT_INSTALLMENTS));
    }
    plan.extra_terms = terms.into_values().collect();

    plan
}

/// Serializes wire pairs into an urlencoded request body.
pub fn to_body(pairs: &[WirePair]) -> String {
    // string pairs always serialize; the fallback is unreachable
    serde_urlencoded::to_string(pairs).unwrap_or_default()
}

/// Parses an urlencoded request body back into wire pairs.
pub fn pairs_from_body(body: &str) -> Vec<WirePair> {
    serde_urlencoded::from_str(body).unwrap_or_default()
}

fn set_option_field(
    options: &mut BTreeMap<u32, ParcelOption>,
    codec: &MoneyCodec,
    slot: &str,
    field: &str,
    value: &str,
) {
    let slot: u32 = match slot.parse() {
        Ok(slot) if slot > 0 => slot,
        _ => return,
    };
    let option = options
        .entry(slot)
        .or_insert_with(|| ParcelOption::with_count(DEFAULT_INSTALLMENTS));
    match field {
        "parcela" => {
            option.installment_count = value.parse().unwrap_or(DEFAULT_INSTALLMENTS);
        }
        "tipo_entrada" => option.entry_type = value.to_string(),
        "entrada" => option.entry_value = value.to_string(),
        "juros" => option.interest = value.to_string(),
        "valor" => option.value = non_empty(codec.remove_mask(value)),
        "desconto" => option.discount = non_empty(codec.remove_mask(value)),
        _ => {}
    }
}

fn set_term_field(terms: &mut BTreeMap<usize, TermEntry>, position: &str, field: &str, value: &str) {
    let Ok(position) = position.parse::<usize>() else {
        return;
    };
    let term = terms.entry(position).or_default();
    match field {
        "name_label" => term.label = value.to_string(),
        "name_valor" => term.text = value.to_string(),
        _ => {}
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Splits `config[parcelas][3][valor]` into its path segments; a trailing
/// `[]` yields an empty segment.
fn split_key(key: &str) -> Vec<&str> {
    let Some(head_end) = key.find('[') else {
        return vec![key];
    };
    let mut segments = vec![&key[..head_end]];
    let mut rest = &key[head_end..];
    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find(']') else {
            break;
        };
        segments.push(&rest[open + 1..open + close]);
        rest = &rest[open + close + 1..];
    }
    segments
}
