//! Built-in pharmaceutical reference documentation used to seed the
//! documentation collection.

use serde_json::Value;
use std::collections::HashMap;

pub struct ReferenceDoc {
    pub doc_type: &'static str,
    pub content: &'static str,
    pub source: &'static str,
    pub standard: &'static str,
    pub priority: &'static str,
}

impl ReferenceDoc {
    pub fn metadata(&self) -> HashMap<String, Value> {
        HashMap::from([
            (
                "source".to_string(),
                Value::String(self.source.to_string()),
            ),
            (
                "standard".to_string(),
                Value::String(self.standard.to_string()),
            ),
            (
                "priority".to_string(),
                Value::String(self.priority.to_string()),
            ),
        ])
    }
}

pub fn default_documentation() -> Vec<ReferenceDoc> {
    vec![
        ReferenceDoc {
            doc_type: "regulatory_guideline",
            content: "21 CFR Part 11 Electronic Records and Electronic Signatures Guidelines: \
                defines the criteria for electronic records and signatures to be considered \
                trustworthy, reliable, and equivalent to paper records. Key requirements include \
                system validation, audit trails, record integrity, user authentication, and \
                controls for open systems. Electronic records must be accurate, reliable, \
                consistently maintained, and readily retrievable throughout the record retention \
                period.",
            source: "FDA",
            standard: "21_CFR_11",
            priority: "high",
        },
        ReferenceDoc {
            doc_type: "quality_standard",
            content: "Good Manufacturing Practice (GMP) Guidelines for Pharmaceutical \
                Manufacturing: GMP ensures that products are consistently produced and controlled \
                according to quality standards. It covers all aspects of production from raw \
                materials, premises and equipment to training and personal hygiene of staff. \
                Quality control must include establishing, documenting, and following procedures \
                that ensure the identity, strength, quality, and purity of drug products.",
            source: "FDA",
            standard: "GMP",
            priority: "high",
        },
        ReferenceDoc {
            doc_type: "process_guideline",
            content: "Pharmaceutical Manufacturing Process Control: critical process parameters \
                include temperature control (±2°C tolerance), pressure monitoring (±5% variance), \
                flow rates (±3% accuracy), mixing speeds (RPM control ±1%), and compression \
                forces (±2% tolerance). These parameters must be continuously monitored and \
                maintained within specified ranges. Process analytical technology (PAT) should be \
                implemented for real-time monitoring, with statistical process control (SPC) \
                charts maintained for trend analysis.",
            source: "internal",
            standard: "process_control",
            priority: "high",
        },
        ReferenceDoc {
            doc_type: "ich_guideline",
            content: "ICH Q7 Good Manufacturing Practice Guide for Active Pharmaceutical \
                Ingredients: quality risk management principles should be applied throughout the \
                pharmaceutical quality system. Risk assessments should be based on scientific \
                knowledge and ultimately link to the protection of patients. The level of effort, \
                formality and documentation of the quality risk management process should be \
                commensurate with the level of risk.",
            source: "ICH",
            standard: "Q7",
            priority: "high",
        },
        ReferenceDoc {
            doc_type: "risk_management",
            content: "ICH Q9 Quality Risk Management: risk management includes the systematic \
                application of quality management policies, procedures, and practices to the \
                tasks of assessing, controlling, communicating and reviewing risk. Typical tools \
                include Failure Mode Effects Analysis (FMEA), Fault Tree Analysis (FTA), Hazard \
                Analysis and Critical Control Points (HACCP), and Risk Ranking and Filtering.",
            source: "ICH",
            standard: "Q9",
            priority: "medium",
        },
        ReferenceDoc {
            doc_type: "compliance_standard",
            content: "Data Integrity Guidelines (ALCOA+ Principles): data must be Attributable, \
                Legible, Contemporaneous, Original, and Accurate, plus Complete, Consistent, \
                Enduring, and Available. All data must be traceable to the individual who \
                performed the work and when it was performed. Original records must be preserved, \
                and data should be recorded at the time the work is performed.",
            source: "FDA",
            standard: "ALCOA_PLUS",
            priority: "high",
        },
        ReferenceDoc {
            doc_type: "quality_standard",
            content: "Quality by Design (QbD) Principles: a systematic approach to pharmaceutical \
                development that begins with predefined objectives and emphasizes product and \
                process understanding based on sound science and quality risk management. Key \
                elements include the Quality Target Product Profile (QTPP), Critical Quality \
                Attributes (CQA), Critical Process Parameters (CPP), Design Space, and Control \
                Strategy.",
            source: "FDA",
            standard: "QbD",
            priority: "medium",
        },
        ReferenceDoc {
            doc_type: "validation_guideline",
            content: "Process Validation Guidelines: process validation is the collection and \
                evaluation of data, from the process design stage throughout commercial \
                production, which establishes scientific evidence that a process is capable of \
                consistently delivering quality products. It consists of three stages: process \
                design, process qualification, and continued process verification.",
            source: "FDA",
            standard: "Process_Validation",
            priority: "high",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_documentation_metadata() {
        let docs = default_documentation();
        assert!(docs.len() >= 6);
        for doc in &docs {
            assert!(!doc.content.is_empty());
            let metadata = doc.metadata();
            assert!(metadata.contains_key("source"));
            assert!(metadata.contains_key("priority"));
        }
    }
}
