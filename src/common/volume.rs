// src/common/volume.rs

//! Cálculos volumétricos: conversão de entradas cruas (texto do formulário ou
//! JSON do servidor) em números, volume em m³ e classes de peso/tamanho.
//! Tudo aqui é puro e determinístico.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Quantidade mínima de um item.
pub const QUANTITY_MIN: u32 = 1;

/// Entrada numérica crua: o que chega de um campo de texto ou do JSON.
pub trait RawNumber {
    fn parse_number(&self) -> f64;
}

impl RawNumber for f64 {
    fn parse_number(&self) -> f64 {
        if self.is_finite() { *self } else { 0.0 }
    }
}

impl RawNumber for u32 {
    fn parse_number(&self) -> f64 {
        f64::from(*self)
    }
}

impl RawNumber for i64 {
    fn parse_number(&self) -> f64 {
        *self as f64
    }
}

impl RawNumber for str {
    fn parse_number(&self) -> f64 {
        let normalized = self.trim().replace(',', ".");
        match normalized.parse::<f64>() {
            Ok(n) if n.is_finite() => n,
            _ => 0.0,
        }
    }
}

impl RawNumber for String {
    fn parse_number(&self) -> f64 {
        self.as_str().parse_number()
    }
}

impl RawNumber for Value {
    fn parse_number(&self) -> f64 {
        match self {
            Value::Number(n) => n.as_f64().unwrap_or(0.0).parse_number(),
            Value::String(s) => s.parse_number(),
            _ => 0.0,
        }
    }
}

impl<T: RawNumber + ?Sized> RawNumber for &T {
    fn parse_number(&self) -> f64 {
        (**self).parse_number()
    }
}

/// Converte texto ou número em `f64`, aceitando vírgula decimal.
/// Nunca devolve NaN: o que não for número finito vira `0.0`.
pub fn parse_number<T: RawNumber + ?Sized>(raw: &T) -> f64 {
    raw.parse_number()
}

/// `largura * altura * comprimento` em m³.
///
/// Como as entradas passam por `parse_number`, o resultado só é NaN quando um
/// `f64` não-finito é passado diretamente; quem chama trata NaN como
/// "desconhecido", nunca como zero.
pub fn volume(width: f64, height: f64, length: f64) -> f64 {
    if !(width.is_finite() && height.is_finite() && length.is_finite()) {
        return f64::NAN;
    }
    width * height * length
}

/// Igual a `volume`, mas a partir de entradas cruas.
pub fn volume_raw<T: RawNumber + ?Sized>(width: &T, height: &T, length: &T) -> f64 {
    volume(parse_number(width), parse_number(height), parse_number(length))
}

/// Extrai um inteiro de uma entrada crua (descartando tudo que não é dígito)
/// e aplica o piso `min`.
pub fn clamp_to_int(raw: &str, min: u32) -> u32 {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let parsed = if digits.is_empty() {
        0
    } else {
        // Overflow satura, não zera
        digits.parse::<u32>().unwrap_or(u32::MAX)
    };
    parsed.max(min)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeightClass {
    #[default]
    #[serde(rename = "N/D")]
    Unknown,
    #[serde(rename = "XS")]
    ExtraSmall,
    #[serde(rename = "S")]
    Small,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
    #[serde(rename = "XL")]
    ExtraLarge,
    #[serde(rename = "XL+")]
    Oversized,
}

impl WeightClass {
    pub fn label(&self) -> &'static str {
        match self {
            WeightClass::Unknown => "N/D",
            WeightClass::ExtraSmall => "XS",
            WeightClass::Small => "S",
            WeightClass::Medium => "M",
            WeightClass::Large => "L",
            WeightClass::ExtraLarge => "XL",
            WeightClass::Oversized => "XL+",
        }
    }
}

impl fmt::Display for WeightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Limites superiores (inclusive) de cada faixa de peso, em kg.
const WEIGHT_BANDS: [(f64, WeightClass); 5] = [
    (1.0, WeightClass::ExtraSmall),
    (5.0, WeightClass::Small),
    (15.0, WeightClass::Medium),
    (30.0, WeightClass::Large),
    (70.0, WeightClass::ExtraLarge),
];

/// Limites superiores (inclusive) de cada faixa de volume unitário, em m³.
const SIZE_BANDS: [(f64, WeightClass); 5] = [
    (0.001, WeightClass::ExtraSmall),
    (0.01, WeightClass::Small),
    (0.1, WeightClass::Medium),
    (0.5, WeightClass::Large),
    (1.0, WeightClass::ExtraLarge),
];

fn classify(value: f64, bands: &[(f64, WeightClass)]) -> WeightClass {
    if !value.is_finite() || value <= 0.0 {
        return WeightClass::Unknown;
    }
    bands
        .iter()
        .find(|(limit, _)| value <= *limit)
        .map(|(_, class)| *class)
        .unwrap_or(WeightClass::Oversized)
}

pub fn weight_class(weight_kg: f64) -> WeightClass {
    classify(weight_kg, &WEIGHT_BANDS)
}

/// Classe de tamanho pelo volume unitário. Usa a mesma escala XS…XL+.
pub fn size_class(volume_m3: f64) -> WeightClass {
    classify(volume_m3, &SIZE_BANDS)
}

/// Para campos numéricos do wire que podem vir como número, texto ("12,5") ou null.
pub fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|v| v.parse_number()).unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("12,5", 12.5)]
    #[case(" 3.25 ", 3.25)]
    #[case("abc", 0.0)]
    #[case("", 0.0)]
    #[case("NaN", 0.0)]
    #[case("inf", 0.0)]
    fn parses_raw_text(#[case] raw: &str, #[case] expected: f64) {
        assert_eq!(parse_number(raw), expected);
    }

    #[test]
    fn parses_json_values() {
        assert_eq!(parse_number(&serde_json::json!(2)), 2.0);
        assert_eq!(parse_number(&serde_json::json!("0,75")), 0.75);
        assert_eq!(parse_number(&serde_json::json!(null)), 0.0);
        assert_eq!(parse_number(&serde_json::json!(true)), 0.0);
    }

    #[test]
    fn volume_is_the_product_of_dimensions() {
        assert_eq!(volume(2.0, 2.0, 2.0), 8.0);
        assert_eq!(volume_raw("1,5", "2", "2"), 6.0);
        assert_eq!(volume_raw("x", "2", "2"), 0.0);
    }

    #[test]
    fn volume_is_unknown_for_non_finite_input() {
        assert!(volume(f64::NAN, 1.0, 1.0).is_nan());
        assert!(volume(1.0, f64::INFINITY, 1.0).is_nan());
    }

    #[rstest]
    #[case("5", 1, 5)]
    #[case("0", 1, 1)]
    #[case("-3", 1, 3)]
    #[case("abc", 1, 1)]
    #[case("1.5", 0, 15)]
    #[case("", 0, 0)]
    #[case("99999999999999", 1, u32::MAX)]
    fn clamps_raw_integers(#[case] raw: &str, #[case] min: u32, #[case] expected: u32) {
        assert_eq!(clamp_to_int(raw, min), expected);
    }

    #[rstest]
    #[case(0.5, WeightClass::ExtraSmall)]
    #[case(1.0, WeightClass::ExtraSmall)]
    #[case(4.2, WeightClass::Small)]
    #[case(15.0, WeightClass::Medium)]
    #[case(29.9, WeightClass::Large)]
    #[case(70.0, WeightClass::ExtraLarge)]
    #[case(120.0, WeightClass::Oversized)]
    #[case(0.0, WeightClass::Unknown)]
    #[case(-2.0, WeightClass::Unknown)]
    #[case(f64::NAN, WeightClass::Unknown)]
    fn bands_weights(#[case] kg: f64, #[case] expected: WeightClass) {
        assert_eq!(weight_class(kg), expected);
    }

    #[test]
    fn unknown_class_is_displayed_as_nd() {
        assert_eq!(WeightClass::Unknown.to_string(), "N/D");
        assert_eq!(size_class(2.0).to_string(), "XL+");
        assert_eq!(size_class(0.05), WeightClass::Medium);
    }

    proptest! {
        #[test]
        fn clamp_to_int_is_idempotent(raw in "\\PC{0,12}", min in 0u32..3) {
            let once = clamp_to_int(&raw, min);
            let twice = clamp_to_int(&once.to_string(), min);
            prop_assert_eq!(once, twice);
            prop_assert!(once >= min);
        }

        #[test]
        fn parse_number_never_returns_nan(raw in "\\PC{0,16}") {
            prop_assert!(parse_number(raw.as_str()).is_finite());
        }

        #[test]
        fn weight_class_is_stable(kg in -10.0f64..200.0) {
            let class = weight_class(kg);
            prop_assert_eq!(class, weight_class(kg));
        }
    }
}
