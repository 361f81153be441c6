use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use super::walker::SupportedFormat;

/// One indexable document extracted from a source file. A plain file yields
/// one document; a portfolio JSON yields one per project.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub text: String,
    pub source_label: String,
}

pub fn extract_documents(path: &Path, format: SupportedFormat) -> Result<Vec<SourceDocument>> {
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    match format {
        SupportedFormat::PlainText => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("no se pudo leer {}", path.display()))?;
            Ok(vec![SourceDocument {
                text,
                source_label: label,
            }])
        }
        SupportedFormat::Pdf => {
            let text = pdf_extract::extract_text(path)
                .with_context(|| format!("no se pudo extraer el PDF {}", path.display()))?;
            Ok(vec![SourceDocument {
                text,
                source_label: label,
            }])
        }
        SupportedFormat::Json => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("no se pudo leer {}", path.display()))?;
            let value: Value = serde_json::from_str(&data)
                .with_context(|| format!("JSON invalido en {}", path.display()))?;
            Ok(expand_json(&value, &label))
        }
    }
}

/// A `{"proyectos": [...]}` portfolio becomes one document per project so
/// retrieval lands on a single project instead of the whole file. Any other
/// JSON shape is indexed as pretty-printed text.
fn expand_json(value: &Value, label: &str) -> Vec<SourceDocument> {
    if let Some(proyectos) = value.get("proyectos").and_then(|p| p.as_array()) {
        return proyectos
            .iter()
            .map(|proyecto| project_document(proyecto, label))
            .collect();
    }
    vec![SourceDocument {
        text: serde_json::to_string_pretty(value).unwrap_or_default(),
        source_label: label.to_string(),
    }]
}

fn project_document(proyecto: &Value, label: &str) -> SourceDocument {
    let field = |name: &str| {
        proyecto
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or("N/A")
            .to_string()
    };
    let nombre = field("nombre");
    let text = format!(
        "Nombre del proyecto: {}\nDescripción: {}\nTécnica y medios: {}\n",
        nombre,
        field("descripcion"),
        field("tecnica_y_medios"),
    );
    SourceDocument {
        text,
        source_label: format!("{} ({})", nombre, label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portfolio_json_expands_per_project() {
        let value: Value = serde_json::from_str(
            r#"{"proyectos": [
                {"nombre": "Raíces", "descripcion": "Instalación", "tecnica_y_medios": "Madera"},
                {"nombre": "Eco", "descripcion": "Serie fotográfica"}
            ]}"#,
        )
        .unwrap();
        let docs = expand_json(&value, "obra.json");
        assert_eq!(docs.len(), 2);
        assert!(docs[0].text.contains("Nombre del proyecto: Raíces"));
        assert!(docs[0].text.contains("Técnica y medios: Madera"));
        assert_eq!(docs[0].source_label, "Raíces (obra.json)");
        // Missing fields fall back to N/A rather than dropping the project.
        assert!(docs[1].text.contains("Técnica y medios: N/A"));
    }

    #[test]
    fn other_json_is_indexed_as_text() {
        let value: Value = serde_json::from_str(r#"{"bio": "artista visual"}"#).unwrap();
        let docs = expand_json(&value, "bio.json");
        assert_eq!(docs.len(), 1);
        assert!(docs[0].text.contains("artista visual"));
    }

    #[test]
    fn plain_text_file_yields_one_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exposiciones.txt");
        std::fs::write(&path, "Expuso en Madrid y Guadalajara").unwrap();
        let docs = extract_documents(&path, SupportedFormat::PlainText).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "Expuso en Madrid y Guadalajara");
        assert_eq!(docs[0].source_label, "exposiciones.txt");
    }
}
