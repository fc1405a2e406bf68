//! Weighted random choice over a fixed table

use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;

use super::templates::{Category, Template};

/// Picks entries with probability proportional to their weight using a
/// cumulative table and one uniform draw per pick.
#[derive(Debug, Clone)]
pub struct WeightedSelector<T> {
    items: Vec<T>,
    index: WeightedIndex<u32>,
}

impl<T: Copy> WeightedSelector<T> {
    pub fn new(entries: &[(T, u32)]) -> Result<Self, WeightedError> {
        let index = WeightedIndex::new(entries.iter().map(|(_, weight)| *weight))?;
        Ok(Self {
            items: entries.iter().map(|(item, _)| *item).collect(),
            index,
        })
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.items[self.index.sample(rng)]
    }
}

/// Two-level choice: a category by category weight, then one of its templates
#[derive(Debug, Clone)]
pub struct TemplateSelector {
    categories: WeightedSelector<Category>,
    templates: Vec<(Category, WeightedSelector<Template>)>,
}

impl TemplateSelector {
    pub fn new() -> Result<Self, WeightedError> {
        let weights: Vec<(Category, u32)> =
            Category::ALL.iter().map(|c| (*c, c.weight())).collect();
        let templates = Category::ALL
            .iter()
            .map(|c| Ok((*c, WeightedSelector::new(c.templates())?)))
            .collect::<Result<Vec<_>, WeightedError>>()?;

        Ok(Self {
            categories: WeightedSelector::new(&weights)?,
            templates,
        })
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Template {
        let category = self.categories.pick(rng);
        self.templates
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, selector)| selector.pick(rng))
            .unwrap_or(Template::SetGet)
    }
}
