use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostType {
    Insumo,
    Racao,
    Manutencao,
    Energia,
    MaoDeObra,
    #[default]
    Outro,
}

impl CostType {
    pub const ALL: [CostType; 6] = [
        CostType::Insumo,
        CostType::Racao,
        CostType::Manutencao,
        CostType::Energia,
        CostType::MaoDeObra,
        CostType::Outro,
    ];

    /// Human-readable label used in lists and exports.
    pub fn label(&self) -> &'static str {
        match self {
            CostType::Insumo => "Insumo",
            CostType::Racao => "Ração",
            CostType::Manutencao => "Manutenção",
            CostType::Energia => "Energia",
            CostType::MaoDeObra => "Mão de obra",
            CostType::Outro => "Outro",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            CostType::Insumo => "insumo",
            CostType::Racao => "racao",
            CostType::Manutencao => "manutencao",
            CostType::Energia => "energia",
            CostType::MaoDeObra => "mao_de_obra",
            CostType::Outro => "outro",
        }
    }
}

impl fmt::Display for CostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for CostType {
    type Err = String;

    /// Accepts both the keys (`mao_de_obra`) and the labels (`Mão de obra`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'á' | 'à' | 'â' | 'ã' => 'a',
                'é' | 'ê' => 'e',
                'í' => 'i',
                'ó' | 'ô' | 'õ' => 'o',
                'ú' => 'u',
                'ç' => 'c',
                ' ' | '-' => '_',
                other => other,
            })
            .collect();

        CostType::ALL
            .into_iter()
            .find(|t| t.key() == normalized)
            .ok_or_else(|| {
                format!(
                    "Invalid cost type '{}'. Valid options: insumo, racao, manutencao, energia, mao_de_obra, outro",
                    s
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_type_default_is_outro() {
        assert_eq!(CostType::default(), CostType::Outro);
    }

    #[test]
    fn test_cost_type_from_key_and_label() {
        assert_eq!(CostType::from_str("insumo").unwrap(), CostType::Insumo);
        assert_eq!(CostType::from_str("Ração").unwrap(), CostType::Racao);
        assert_eq!(CostType::from_str("MANUTENÇÃO").unwrap(), CostType::Manutencao);
        assert_eq!(CostType::from_str("Mão de obra").unwrap(), CostType::MaoDeObra);
        assert_eq!(CostType::from_str("mao-de-obra").unwrap(), CostType::MaoDeObra);
    }

    #[test]
    fn test_cost_type_from_str_invalid() {
        assert!(CostType::from_str("fertilizante").is_err());
        assert!(CostType::from_str("").is_err());
    }

    #[test]
    fn test_cost_type_json() {
        let json = serde_json::to_string(&CostType::MaoDeObra).unwrap();
        assert_eq!(json, "\"mao_de_obra\"");

        let parsed: CostType = serde_json::from_str("\"racao\"").unwrap();
        assert_eq!(parsed, CostType::Racao);
    }
}
