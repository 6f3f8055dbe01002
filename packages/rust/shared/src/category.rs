//! Topic categorization.
//!
//! A topic belongs to exactly one [`Category`]. Each category carries keyword
//! lists for detection, search-query templates for resource acquisition, and
//! subtopic title templates used when naming tree nodes.
//!
//! Detection keyword lists are Portuguese-leaning because the default request
//! language is "pt"; English cognates are included where they differ.

use serde::{Deserialize, Serialize};

/// Closed set of topic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Technology,
    Finance,
    Health,
    Education,
    Arts,
    Science,
    Business,
    Lifestyle,
    General,
}

impl Category {
    /// All categories, detection candidates first (General is the fallback
    /// and has no keywords).
    pub const ALL: [Category; 9] = [
        Category::Technology,
        Category::Finance,
        Category::Health,
        Category::Education,
        Category::Arts,
        Category::Science,
        Category::Business,
        Category::Lifestyle,
        Category::General,
    ];

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Technology => "technology",
            Self::Finance => "finance",
            Self::Health => "health",
            Self::Education => "education",
            Self::Arts => "arts",
            Self::Science => "science",
            Self::Business => "business",
            Self::Lifestyle => "lifestyle",
            Self::General => "general",
        }
    }

    /// Detect the category of a free-text topic by counting keyword hits.
    /// Ties go to the first category in [`Category::ALL`] order; no hits at
    /// all falls back to `General`.
    pub fn detect(topic: &str) -> Self {
        let topic = topic.to_lowercase();
        let mut best = Category::General;
        let mut best_hits = 0usize;

        for category in Self::ALL {
            let hits = category
                .keywords()
                .iter()
                .filter(|kw| topic.contains(*kw))
                .count();
            if hits > best_hits {
                best = category;
                best_hits = hits;
            }
        }

        best
    }

    /// Keywords whose presence in a topic votes for this category.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Technology => &[
                "programação", "programming", "software", "hardware", "desenvolvimento",
                "código", "code", "app", "aplicativo", "tecnologia", "computador",
                "internet", "web", "digital", "developer", "python", "javascript",
                "rust", "java",
            ],
            Self::Finance => &[
                "finanças", "finance", "dinheiro", "investimento", "economia",
                "mercado", "bolsa", "ações", "poupança", "orçamento", "financeiro",
                "banco", "crédito", "monetário",
            ],
            Self::Health => &[
                "saúde", "health", "bem-estar", "medicina", "fitness", "nutrição",
                "exercício", "dieta", "médico", "terapia", "mental", "doença",
                "prevenção",
            ],
            Self::Education => &[
                "educação", "education", "aprendizagem", "ensino", "escola",
                "faculdade", "universidade", "curso", "aula", "professor", "aluno",
                "estudante", "pedagogia", "didática",
            ],
            Self::Arts => &[
                "arte", "música", "music", "pintura", "literatura", "cinema",
                "teatro", "dança", "escultura", "fotografia", "design", "criativo",
                "cultural", "artístico",
            ],
            Self::Science => &[
                "ciência", "science", "física", "química", "biologia", "matemática",
                "astronomia", "geologia", "pesquisa", "laboratório", "experimento",
                "científico", "teoria",
            ],
            Self::Business => &[
                "negócios", "business", "empreendedorismo", "empresa", "startup",
                "gestão", "marketing", "vendas", "administração", "liderança",
                "estratégia", "comercial",
            ],
            Self::Lifestyle => &[
                "estilo de vida", "lifestyle", "hobby", "lazer", "viagem",
                "culinária", "gastronomia", "decoração", "moda", "jardinagem",
                "pets", "casa", "família",
            ],
            Self::General => &[],
        }
    }

    /// Search-query templates for resource acquisition. `{topic}` is the
    /// substitution marker.
    pub fn resource_queries(self) -> &'static [&'static str] {
        match self {
            Self::Technology => &[
                "{topic} tutorial",
                "{topic} documentation",
                "{topic} best practices",
                "{topic} examples",
                "{topic} guide",
            ],
            Self::Finance => &[
                "{topic} guia",
                "{topic} tutorial",
                "{topic} explicado",
                "{topic} para iniciantes",
                "{topic} avançado",
            ],
            Self::Health => &[
                "{topic} guia completo",
                "{topic} benefícios",
                "{topic} como funciona",
                "{topic} dicas",
                "{topic} profissional",
            ],
            Self::Education => &[
                "{topic} metodologia",
                "{topic} recursos",
                "{topic} aplicações",
                "{topic} guia para professores",
                "{topic} para estudantes",
            ],
            Self::Arts => &[
                "{topic} técnicas",
                "{topic} história",
                "{topic} como fazer",
                "{topic} exemplos",
                "{topic} para iniciantes",
            ],
            Self::Science => &[
                "{topic} explicado",
                "{topic} pesquisa",
                "{topic} teoria",
                "{topic} aplicações",
                "{topic} experimentos",
            ],
            Self::Business => &[
                "{topic} estratégias",
                "{topic} guia",
                "{topic} cases",
                "{topic} ferramentas",
                "{topic} tendências",
            ],
            Self::Lifestyle => &[
                "{topic} dicas",
                "{topic} como começar",
                "{topic} ideias",
                "{topic} inspiração",
                "{topic} passo a passo",
            ],
            Self::General => &[
                "{topic} tutorial",
                "{topic} guia",
                "{topic} introdução",
                "{topic} exemplos",
                "{topic} avançado",
            ],
        }
    }

    /// Subtopic title templates used for lesson node names, in pedagogical
    /// order (introductory themes before advanced ones).
    pub fn subtopic_templates(self) -> &'static [&'static str] {
        match self {
            Self::Technology => &[
                "Fundamentos de {topic}",
                "Ferramentas para {topic}",
                "Boas práticas em {topic}",
                "Frameworks de {topic}",
                "Arquitetura de {topic}",
                "Testes em {topic}",
                "Depuração de {topic}",
                "Segurança em {topic}",
                "Otimização de {topic}",
                "Implementação de {topic}",
                "Configuração de {topic}",
                "Tendências em {topic}",
            ],
            Self::Finance => &[
                "Princípios básicos de {topic}",
                "Planejamento de {topic}",
                "Orçamento para {topic}",
                "Estratégias de {topic}",
                "Análise de {topic}",
                "Gestão de riscos em {topic}",
                "Investimentos em {topic}",
                "Ferramentas para {topic}",
                "Regulamentação de {topic}",
                "Tributação em {topic}",
                "Estudos de caso em {topic}",
                "Tendências em {topic}",
            ],
            Self::Health => &[
                "Fundamentos de {topic}",
                "Benefícios de {topic}",
                "Práticas recomendadas para {topic}",
                "Técnicas de {topic}",
                "Equipamentos para {topic}",
                "Riscos associados a {topic}",
                "Prevenção através de {topic}",
                "Tratamentos com {topic}",
                "Pesquisas sobre {topic}",
                "Profissionais de {topic}",
                "Aplicações de {topic}",
                "Histórico de {topic}",
            ],
            Self::Education => &[
                "Metodologias de {topic}",
                "Recursos para {topic}",
                "Teorias de {topic}",
                "Práticas de {topic}",
                "Avaliação em {topic}",
                "Tecnologias para {topic}",
                "Estratégias de {topic}",
                "Desafios em {topic}",
                "Aplicações de {topic}",
                "Desenvolvimento de {topic}",
                "Inovação em {topic}",
                "Tendências em {topic}",
            ],
            Self::Arts => &[
                "História de {topic}",
                "Técnicas de {topic}",
                "Estilos de {topic}",
                "Materiais para {topic}",
                "Criação de {topic}",
                "Artistas de {topic}",
                "Movimentos em {topic}",
                "Análise de {topic}",
                "Apreciação de {topic}",
                "Exposições de {topic}",
                "Ensino de {topic}",
                "Tendências em {topic}",
            ],
            Self::Science => &[
                "Princípios de {topic}",
                "Teorias de {topic}",
                "Metodologia de {topic}",
                "Experimentos em {topic}",
                "Equipamentos para {topic}",
                "Aplicações de {topic}",
                "História de {topic}",
                "Pesquisadores de {topic}",
                "Descobertas em {topic}",
                "Avanços em {topic}",
                "Impacto de {topic}",
                "Futuro de {topic}",
            ],
            Self::Business => &[
                "Fundamentos de {topic}",
                "Planejamento de {topic}",
                "Estratégias de {topic}",
                "Gestão de {topic}",
                "Análise de {topic}",
                "Ferramentas para {topic}",
                "Métricas para {topic}",
                "Liderança em {topic}",
                "Casos de sucesso em {topic}",
                "Desafios em {topic}",
                "Inovação em {topic}",
                "Tendências em {topic}",
            ],
            Self::Lifestyle => &[
                "Introdução a {topic}",
                "Técnicas de {topic}",
                "Equipamentos para {topic}",
                "Dicas para {topic}",
                "Benefícios de {topic}",
                "Projetos de {topic}",
                "Comunidades de {topic}",
                "Eventos de {topic}",
                "História de {topic}",
                "Inspirações para {topic}",
                "Personalização de {topic}",
                "Tendências em {topic}",
            ],
            Self::General => &[
                "Introdução a {topic}",
                "Conceitos básicos de {topic}",
                "Fundamentos de {topic}",
                "Aplicações de {topic}",
                "Técnicas de {topic}",
                "Ferramentas para {topic}",
                "Práticas de {topic}",
                "Exemplos de {topic}",
                "Desafios em {topic}",
                "Tópicos avançados de {topic}",
                "Recursos sobre {topic}",
                "Tendências em {topic}",
            ],
        }
    }

    /// Extra tags attached to trees in this category.
    pub fn tag_extras(self) -> &'static [&'static str] {
        match self {
            Self::Technology => &["programming", "coding", "development", "tech"],
            Self::Finance => &["money", "investment", "financial", "economy"],
            Self::Health => &["wellness", "fitness", "nutrition", "medical"],
            Self::Education => &["learning", "teaching", "academic", "school"],
            Self::Arts => &["creative", "artistic", "design", "culture"],
            Self::Science => &["research", "scientific", "experiment", "theory"],
            Self::Business => &["entrepreneurship", "management", "strategy", "marketing"],
            Self::Lifestyle => &["personal", "hobby", "leisure", "self-improvement"],
            Self::General => &[],
        }
    }

    /// Render a template list with the topic substituted, keeping order.
    pub fn render(templates: &[&str], topic: &str) -> Vec<String> {
        templates
            .iter()
            .map(|t| t.replace("{topic}", topic))
            .collect()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}
